// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate scoring, best-of selection, and the acceptance policy that turns
// the best candidate into a quality tier.
//
// Geometry stages never look at the policy; temporal smoothing, if ever
// wanted, belongs in `AcceptancePolicy` alone.

use imageproc::geometry::{self, convex_hull};
use imageproc::point::Point;
use scanwerk_core::config::{Band, DetectionConfig, ScoreWeights};
use scanwerk_core::types::QualityTier;

use super::polygon::Quad;

/// The four sub-scores that make up a candidate's composite score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub size: f64,
    pub aspect: f64,
    pub rectangularity: f64,
    pub convexity: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.size + self.aspect + self.rectangularity + self.convexity
    }
}

/// A quadrilateral with its composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub quad: Quad,
    /// Area of the contour the quad was reduced from.
    pub contour_area: f64,
    pub breakdown: ScoreBreakdown,
    pub score: f64,
}

/// Scores quadrilaterals against one frame.
#[derive(Debug, Clone, Copy)]
pub struct CandidateScorer {
    frame_area: f64,
    weights: ScoreWeights,
    size_band: Band,
    aspect_band: Band,
}

impl CandidateScorer {
    pub fn new(frame_area: f64, config: &DetectionConfig) -> Self {
        Self {
            frame_area,
            weights: config.weights,
            size_band: config.size_band,
            aspect_band: config.aspect_band,
        }
    }

    /// Score one quadrilateral.
    ///
    /// * size: full weight when `contour_area / frame_area` is inside the band
    /// * aspect: full weight when bounding-box `width / height` is inside the band
    /// * rectangularity: quad area over its bounding-box area, scaled
    /// * convexity: quad area over its convex-hull area, scaled
    pub fn score(&self, quad: Quad, contour_area: f64) -> Candidate {
        let (_, _, w, h) = quad.bounding_box();
        let quad_area = quad.area();

        let size_ratio = if self.frame_area > 0.0 {
            contour_area / self.frame_area
        } else {
            0.0
        };
        let size = if self.size_band.contains(size_ratio) {
            self.weights.size
        } else {
            0.0
        };

        let aspect = if h > 0 && self.aspect_band.contains(w as f64 / h as f64) {
            self.weights.aspect
        } else {
            0.0
        };

        let bbox_area = w as f64 * h as f64;
        let rectangularity = ratio(quad_area, bbox_area) * self.weights.rectangularity;

        let hull: Vec<Point<i32>> = convex_hull(&quad.0[..]);
        let convexity = ratio(quad_area, geometry::contour_area(&hull)) * self.weights.convexity;

        let breakdown = ScoreBreakdown {
            size,
            aspect,
            rectangularity,
            convexity,
        };
        Candidate {
            quad,
            contour_area,
            breakdown,
            score: breakdown.total(),
        }
    }
}

/// `num / den` clamped to [0, 1]; zero when the denominator vanishes.
fn ratio(num: f64, den: f64) -> f64 {
    if den <= 0.0 {
        0.0
    } else {
        (num / den).clamp(0.0, 1.0)
    }
}

/// Keeps the single highest-scoring candidate of a pass. Ties keep the
/// earlier candidate so results follow contour discovery order.
#[derive(Debug, Default)]
pub struct BestCandidate {
    best: Option<Candidate>,
    offered: usize,
}

impl BestCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, candidate: Candidate) {
        self.offered += 1;
        match &self.best {
            Some(current) if current.score >= candidate.score => {}
            _ => self.best = Some(candidate),
        }
    }

    pub fn offered(&self) -> usize {
        self.offered
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    pub fn into_best(self) -> Option<Candidate> {
        self.best
    }
}

/// Decides whether the best candidate becomes a detection and how good it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptancePolicy {
    /// Score must be strictly greater than this.
    pub threshold: f64,
    pub good_above: f64,
    pub excellent_above: f64,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

impl AcceptancePolicy {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            threshold: config.acceptance_threshold,
            good_above: config.good_above,
            excellent_above: config.excellent_above,
        }
    }

    /// Whether a score clears the acceptance threshold.
    pub fn accepts(&self, score: f64) -> bool {
        score > self.threshold
    }

    /// Tier for an accepted score.
    pub fn tier(&self, score: f64) -> QualityTier {
        if score > self.excellent_above {
            QualityTier::Excellent
        } else if score > self.good_above {
            QualityTier::Good
        } else {
            QualityTier::Poor
        }
    }

    /// The accepted candidate and its tier, or `None` below threshold.
    pub fn evaluate(&self, best: Option<Candidate>) -> Option<(Candidate, QualityTier)> {
        let candidate = best?;
        self.accepts(candidate.score)
            .then(|| (candidate, self.tier(candidate.score)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(pts: [(i32, i32); 4]) -> Quad {
        Quad(pts.map(|(x, y)| Point::new(x, y)))
    }

    fn scorer() -> CandidateScorer {
        CandidateScorer::new(1000.0 * 1000.0, &DetectionConfig::default())
    }

    #[test]
    fn clean_rectangle_scores_full_marks() {
        let q = quad([(100, 100), (700, 100), (700, 900), (100, 900)]);
        let c = scorer().score(q, 480_000.0);
        assert_eq!(c.breakdown.size, 30.0);
        assert_eq!(c.breakdown.aspect, 25.0);
        assert!((c.breakdown.rectangularity - 25.0).abs() < 1e-9);
        assert!((c.breakdown.convexity - 20.0).abs() < 1e-9);
        assert!((c.score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_quad_loses_size_score() {
        let q = quad([(0, 0), (950, 0), (950, 950), (0, 950)]);
        let c = scorer().score(q, 950.0 * 950.0);
        assert_eq!(c.breakdown.size, 0.0);
        assert_eq!(c.breakdown.aspect, 25.0);
    }

    #[test]
    fn sliver_loses_aspect_score() {
        let q = quad([(100, 400), (900, 400), (900, 600), (100, 600)]);
        let c = scorer().score(q, 800.0 * 200.0);
        // 4:1 is outside 0.3..3.0
        assert_eq!(c.breakdown.aspect, 0.0);
        assert_eq!(c.breakdown.size, 30.0);
    }

    #[test]
    fn rotated_square_is_half_rectangular() {
        let q = quad([(500, 100), (900, 500), (500, 900), (100, 500)]);
        let c = scorer().score(q, 320_000.0);
        assert!((c.breakdown.rectangularity - 12.5).abs() < 1e-9);
        assert!((c.breakdown.convexity - 20.0).abs() < 1e-9);
    }

    #[test]
    fn concave_quad_is_penalized() {
        // Dart: the fourth vertex is pulled inside the triangle of the others.
        let q = quad([(100, 100), (900, 500), (100, 900), (400, 500)]);
        let c = scorer().score(q, 200_000.0);
        assert!(c.breakdown.convexity < 20.0 * 0.7);
    }

    #[test]
    fn best_keeps_highest_and_first_on_ties() {
        let q = quad([(0, 0), (1, 0), (1, 1), (0, 1)]);
        let make = |score: f64, area: f64| Candidate {
            quad: q,
            contour_area: area,
            breakdown: ScoreBreakdown::default(),
            score,
        };
        let mut best = BestCandidate::new();
        best.offer(make(50.0, 1.0));
        best.offer(make(70.0, 2.0));
        best.offer(make(70.0, 3.0));
        best.offer(make(65.0, 4.0));
        assert_eq!(best.offered(), 4);
        let winner = best.into_best().expect("winner");
        assert_eq!(winner.score, 70.0);
        assert_eq!(winner.contour_area, 2.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        let policy = AcceptancePolicy::default();
        assert!(!policy.accepts(40.0));
        assert!(policy.accepts(41.0));
    }

    #[test]
    fn tier_boundaries() {
        let policy = AcceptancePolicy::default();
        assert_eq!(policy.tier(41.0), QualityTier::Poor);
        assert_eq!(policy.tier(60.0), QualityTier::Poor);
        assert_eq!(policy.tier(61.0), QualityTier::Good);
        assert_eq!(policy.tier(80.0), QualityTier::Good);
        assert_eq!(policy.tier(81.0), QualityTier::Excellent);
    }

    #[test]
    fn evaluate_rejects_empty_and_low() {
        let policy = AcceptancePolicy::default();
        assert!(policy.evaluate(None).is_none());

        let q = quad([(0, 0), (1, 0), (1, 1), (0, 1)]);
        let low = Candidate {
            quad: q,
            contour_area: 1.0,
            breakdown: ScoreBreakdown::default(),
            score: 40.0,
        };
        assert!(policy.evaluate(Some(low)).is_none());
        let ok = Candidate { score: 55.0, ..low };
        assert_eq!(policy.evaluate(Some(ok)).map(|(_, t)| t), Some(QualityTier::Poor));
    }
}
