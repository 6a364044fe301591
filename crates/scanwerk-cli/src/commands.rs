// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers. Each one is a plain function over parsed arguments so
// it can be driven from tests without a process boundary.

use std::fmt;
use std::path::{Path, PathBuf};

use scanwerk_capture::{StillImageSource, TickOutcome, run_tick};
use scanwerk_core::config::ScanConfig;
use scanwerk_core::error::Result;
use scanwerk_core::feedback::guidance;
use scanwerk_core::types::{CropHint, DetectedQuadrilateral};
use scanwerk_document::{Adjustments, Detector, ImageProcessor};
use serde::Serialize;
use tracing::{info, instrument};

pub struct DetectArgs {
    pub image: PathBuf,
    pub config: Option<PathBuf>,
}

pub struct ExportArgs {
    pub image: PathBuf,
    pub config: Option<PathBuf>,
    pub out: PathBuf,
    pub adjustments: Adjustments,
    pub rotate: f32,
    pub crop: bool,
}

/// Everything `scanwerk detect` reports about one image.
#[derive(Debug, Clone, Serialize)]
pub struct DetectReport {
    pub image: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Corners in image pixels. The still source is shown at its native size,
    /// so display and image coordinates coincide.
    pub detection: Option<DetectedQuadrilateral>,
    pub crop_hint: Option<CropHint>,
    pub guidance: String,
    pub suggest_crop: bool,
}

/// What `scanwerk export` wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub out: PathBuf,
    pub width: u32,
    pub height: u32,
    pub cropped: bool,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} ({}x{}{})",
            self.out.display(),
            self.width,
            self.height,
            if self.cropped { ", cropped" } else { "" }
        )
    }
}

fn load_settings(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => {
            let settings = ScanConfig::load(path)?;
            info!(path = %path.display(), "Settings loaded");
            Ok(settings)
        }
        None => Ok(ScanConfig::default()),
    }
}

/// Run one detection pass over the image as if it were a live frame.
fn detect_image(processor: &ImageProcessor, settings: &ScanConfig) -> Result<Option<DetectedQuadrilateral>> {
    if !settings.detection_enabled {
        info!("Detection disabled in settings; skipping");
        return Ok(None);
    }
    let detector = Detector::new(settings.detection.clone())?;
    let source = StillImageSource::new(processor.as_dynamic().clone());
    Ok(match run_tick(&source, &detector) {
        TickOutcome::Analyzed(detection) => detection,
        TickOutcome::NotReady => None,
    })
}

#[instrument(skip_all, fields(image = %args.image.display()))]
pub fn detect(args: &DetectArgs) -> Result<DetectReport> {
    let settings = load_settings(args.config.as_deref())?;
    let processor = ImageProcessor::open(&args.image)?;
    let (width, height) = (processor.width(), processor.height());

    let detection = detect_image(&processor, &settings)?;
    let hint = detection.and_then(|d| d.crop_hint(width, height));
    let advice = guidance(detection.as_ref());

    Ok(DetectReport {
        image: args.image.clone(),
        width,
        height,
        detection,
        crop_hint: hint,
        guidance: advice.message.to_string(),
        suggest_crop: advice.should_suggest_crop,
    })
}

pub fn print_report(report: &DetectReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{} ({}x{})", report.image.display(), report.width, report.height);
    match &report.detection {
        Some(det) => {
            println!(
                "  document: {} (score {:.1}, confidence {:.2})",
                det.quality, det.score, det.confidence
            );
            println!("    top-left     {}", det.corners.top_left);
            println!("    top-right    {}", det.corners.top_right);
            println!("    bottom-right {}", det.corners.bottom_right);
            println!("    bottom-left  {}", det.corners.bottom_left);
        }
        None => println!("  no document"),
    }
    if let Some(hint) = &report.crop_hint {
        println!(
            "  crop: {}x{} at ({}, {})",
            hint.width, hint.height, hint.x, hint.y
        );
    }
    println!("  {}", report.guidance);
    Ok(())
}

#[instrument(skip_all, fields(image = %args.image.display(), out = %args.out.display()))]
pub fn export(args: &ExportArgs) -> Result<ExportSummary> {
    let settings = load_settings(args.config.as_deref())?;
    let mut processor = ImageProcessor::open(&args.image)?;

    let hint = if args.crop {
        detect_image(&processor, &settings)?
            .and_then(|d| d.crop_hint(processor.width(), processor.height()))
    } else {
        None
    };
    let cropped = hint.is_some();
    if let Some(hint) = &hint {
        processor = processor.crop_to_hint(hint);
    }

    let processor = processor.rotate(args.rotate).adjust(&args.adjustments);
    processor.save(&args.out)?;

    info!(cropped, width = processor.width(), height = processor.height(), "Export written");
    Ok(ExportSummary {
        out: args.out.clone(),
        width: processor.width(),
        height: processor.height(),
        cropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use scanwerk_core::types::{CoordinateSpace, QualityTier};

    /// 400x300 photo with a light card from (80, 60) to (320, 240).
    fn write_card(dir: &Path) -> PathBuf {
        let mut img = RgbaImage::from_pixel(400, 300, Rgba([40, 45, 50, 255]));
        for y in 60..240 {
            for x in 80..320 {
                img.put_pixel(x, y, Rgba([235, 235, 230, 255]));
            }
        }
        let path = dir.join("card.png");
        DynamicImage::ImageRgba8(img).save(&path).expect("write fixture");
        path
    }

    fn write_blank(dir: &Path) -> PathBuf {
        let path = dir.join("blank.png");
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 100, Rgba([90, 90, 90, 255])))
            .save(&path)
            .expect("write fixture");
        path
    }

    fn export_args(image: PathBuf, out: PathBuf) -> ExportArgs {
        ExportArgs {
            image,
            config: None,
            out,
            adjustments: Adjustments::default(),
            rotate: 0.0,
            crop: true,
        }
    }

    #[test]
    fn detect_finds_card() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = detect(&DetectArgs {
            image: write_card(dir.path()),
            config: None,
        })
        .expect("detect");

        let det = report.detection.expect("detection");
        assert!(det.quality >= QualityTier::Good);
        assert_eq!(det.space, CoordinateSpace::Display);
        assert!((det.corners.top_left.x - 80.0).abs() <= 8.0);
        assert!((det.corners.bottom_right.y - 240.0).abs() <= 8.0);
        assert!(report.suggest_crop);
        let hint = report.crop_hint.expect("hint");
        assert!(hint.x.abs_diff(80) <= 8);
        assert!(hint.width.abs_diff(240) <= 16);
    }

    #[test]
    fn detect_on_blank_reports_no_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = detect(&DetectArgs {
            image: write_blank(dir.path()),
            config: None,
        })
        .expect("detect");
        assert!(report.detection.is_none());
        assert!(report.crop_hint.is_none());
        assert!(!report.suggest_crop);
    }

    #[test]
    fn report_serializes_to_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = detect(&DetectArgs {
            image: write_card(dir.path()),
            config: None,
        })
        .expect("detect");
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["width"], 400);
        assert!(json["detection"]["corners"]["top_left"]["x"].is_number());
    }

    #[test]
    fn disabled_detection_from_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join("scan.json");
        std::fs::write(&config, r#"{ "detection_enabled": false }"#).expect("write config");

        let report = detect(&DetectArgs {
            image: write_card(dir.path()),
            config: Some(config),
        })
        .expect("detect");
        assert!(report.detection.is_none());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = detect(&DetectArgs {
            image: write_card(dir.path()),
            config: Some(dir.path().join("nope.json")),
        });
        assert!(result.is_err());
    }

    #[test]
    fn export_crops_to_detected_card() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out.png");
        let summary = export(&export_args(write_card(dir.path()), out.clone())).expect("export");

        assert!(summary.cropped);
        assert!(summary.width.abs_diff(240) <= 16);
        assert!(summary.height.abs_diff(180) <= 16);
        let written = image::open(&out).expect("read output");
        assert_eq!((written.width(), written.height()), (summary.width, summary.height));
    }

    #[test]
    fn export_without_crop_keeps_frame_and_rotates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out.jpg");
        let args = ExportArgs {
            crop: false,
            rotate: 90.0,
            adjustments: Adjustments {
                brightness: 10,
                ..Default::default()
            },
            ..export_args(write_card(dir.path()), out.clone())
        };
        let summary = export(&args).expect("export");
        assert!(!summary.cropped);
        assert_eq!((summary.width, summary.height), (300, 400));
        assert!(out.exists());
    }

    #[test]
    fn export_of_blank_image_is_uncropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out.png");
        let summary = export(&export_args(write_blank(dir.path()), out)).expect("export");
        assert!(!summary.cropped);
        assert_eq!((summary.width, summary.height), (200, 100));
    }
}
