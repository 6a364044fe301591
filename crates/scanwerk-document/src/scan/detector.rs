// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detector: runs one full detection pass over a processing frame.
//
// Every failure inside a pass is contained here. Callers see either a
// detection or nothing; the sampling loop keeps running either way.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use image::DynamicImage;
use scanwerk_core::config::DetectionConfig;
use scanwerk_core::error::Result;
use scanwerk_core::types::{CoordinateSpace, DetectedQuadrilateral, DisplayGeometry, Point};
use tracing::{debug, instrument, warn};

use super::contours::external_contours;
use super::corners::{label_corners, rescale_to_display, rescale_to_native};
use super::edges::{EdgeMap, extract_edges};
use super::polygon::PolygonApproximator;
use super::sampler::{Frame, FrameSampler};
use super::score::{AcceptancePolicy, BestCandidate, CandidateScorer};

/// Counters collected during one pass. Purely diagnostic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// External contours traced.
    pub contours: usize,
    /// Contours dropped at the area gate.
    pub rejected_for_area: usize,
    /// Approximated polygons keyed by vertex count.
    pub vertex_counts: BTreeMap<usize, usize>,
    /// Quadrilaterals that reached the scorer.
    pub quads_scored: usize,
    /// Best candidate score, accepted or not.
    pub best_score: Option<f64>,
    pub elapsed: Duration,
}

/// Stateless document detector. One instance can serve any number of passes.
#[derive(Debug, Clone)]
pub struct Detector {
    config: DetectionConfig,
    sampler: FrameSampler,
    policy: AcceptancePolicy,
}

impl Detector {
    /// Build a detector after validating `config`.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sampler: FrameSampler::new(config.downsample_factor),
            policy: AcceptancePolicy::from_config(&config),
            config,
        })
    }

    /// Replace the acceptance policy. Geometry stages are unaffected.
    pub fn with_policy(mut self, policy: AcceptancePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn sampler(&self) -> &FrameSampler {
        &self.sampler
    }

    pub fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    // -- Entry points ---------------------------------------------------------

    /// Analyse one processing frame. Coordinates are in processing space.
    ///
    /// Internal failures are logged and reported as "no detection".
    #[instrument(skip_all, fields(w = frame.width(), h = frame.height()))]
    pub fn analyze_frame(&self, frame: &Frame) -> Option<DetectedQuadrilateral> {
        match self.analyze_with_report(frame) {
            Ok((detection, _)) => detection,
            Err(err) => {
                warn!(error = %err, "Detection pass failed; treating as no detection");
                None
            }
        }
    }

    /// Analyse one processing frame and return the pass counters as well.
    pub fn analyze_with_report(
        &self,
        frame: &Frame,
    ) -> Result<(Option<DetectedQuadrilateral>, PassReport)> {
        let started = Instant::now();
        let edges = extract_edges(frame, &self.config)?;
        let (detection, mut report) = self.detect_in_edge_map(&edges);
        report.elapsed = started.elapsed();
        Ok((detection, report))
    }

    /// Run contour tracing, approximation, scoring and labelling on an
    /// already-binary edge map. The map's own size is the frame area.
    pub fn detect_in_edge_map(&self, edges: &EdgeMap) -> (Option<DetectedQuadrilateral>, PassReport) {
        let frame_area = edges.area();
        let approximator = PolygonApproximator::new(
            frame_area,
            self.config.min_area_ratio,
            self.config.approx_epsilon_ratio,
        );
        let scorer = CandidateScorer::new(frame_area, &self.config);
        let mut best = BestCandidate::new();
        let mut report = PassReport::default();

        for contour in external_contours(edges) {
            report.contours += 1;
            let Some(polygon) = approximator.approximate(&contour) else {
                report.rejected_for_area += 1;
                continue;
            };
            *report.vertex_counts.entry(polygon.vertex_count()).or_default() += 1;
            if let Some(quad) = polygon.as_quad() {
                best.offer(scorer.score(quad, contour.enclosed_area()));
            }
        }

        report.quads_scored = best.offered();
        report.best_score = best.best().map(|c| c.score);

        let detection = self.policy.evaluate(best.into_best()).map(|(candidate, tier)| {
            let vertices = candidate
                .quad
                .0
                .map(|p| Point::new(p.x as f64, p.y as f64));
            DetectedQuadrilateral::new(
                label_corners(vertices),
                CoordinateSpace::Processing,
                candidate.score,
                tier,
            )
        });

        debug!(
            contours = report.contours,
            rejected_for_area = report.rejected_for_area,
            quads = report.quads_scored,
            best_score = ?report.best_score,
            accepted = detection.is_some(),
            quality = ?detection.map(|d| d.quality),
            "Detection pass complete"
        );

        (detection, report)
    }

    /// Sample a native frame, analyse it and project the result onto the
    /// overlay. `None` means not ready, nothing found, or a failed pass.
    pub fn analyze_native(
        &self,
        native: &DynamicImage,
        geometry: &DisplayGeometry,
    ) -> Option<DetectedQuadrilateral> {
        let frame = self.sampler.sample(native)?;
        let detection = self.analyze_frame(&frame)?;
        match project_to_display(&detection, frame.downsample_factor(), geometry) {
            Ok(projected) => Some(projected),
            Err(err) => {
                warn!(error = %err, "Could not rescale detection to display");
                None
            }
        }
    }
}

/// Processing space to native to display, in that order.
pub fn project_to_display(
    detection: &DetectedQuadrilateral,
    downsample_factor: f64,
    geometry: &DisplayGeometry,
) -> Result<DetectedQuadrilateral> {
    let native = rescale_to_native(detection, downsample_factor)?;
    rescale_to_display(&native, geometry)
}
