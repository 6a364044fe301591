// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection configuration. Every tunable constant of the pipeline lives here
// and is passed by value into the detector and the capture session.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// How the binary edge map is derived from the blurred grayscale frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStrategy {
    /// Canny directly on the blurred grayscale.
    #[default]
    Gradient,
    /// Local-mean adaptive threshold first, then Canny on the binary image.
    AdaptiveThreshold,
}

/// Open interval `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Strictly inside the band.
    pub fn contains(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }
}

/// Maximum contribution of each sub-score to the composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub size: f64,
    pub aspect: f64,
    pub rectangularity: f64,
    pub convexity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            size: 30.0,
            aspect: 25.0,
            rectangularity: 25.0,
            convexity: 20.0,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.size + self.aspect + self.rectangularity + self.convexity
    }
}

/// Tunables for one detection pass and the sampling loop that drives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Frame sampler scale applied to the native frame (0.5 = half size).
    pub downsample_factor: f64,
    /// Delay between the end of one pass and the start of the next.
    pub cadence_ms: u64,
    /// Gaussian sigma; 1.1 matches a 5x5 kernel.
    pub blur_sigma: f32,
    pub edge_strategy: EdgeStrategy,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Neighbourhood radius for the adaptive threshold strategy.
    pub adaptive_block_radius: u32,
    /// Offset subtracted from the local mean for the adaptive threshold.
    pub adaptive_offset: i32,
    /// Closing radius in pixels (1 = 3x3 structuring element).
    pub closing_radius: u8,
    /// Contours enclosing less than this fraction of the frame are dropped.
    pub min_area_ratio: f64,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    pub weights: ScoreWeights,
    /// Area / frame area band that earns the size score.
    pub size_band: Band,
    /// Width / height band that earns the aspect score.
    pub aspect_band: Band,
    /// Best score must be strictly greater than this to be accepted.
    pub acceptance_threshold: f64,
    /// Scores strictly above this are at least `good`.
    pub good_above: f64,
    /// Scores strictly above this are `excellent`.
    pub excellent_above: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            downsample_factor: 0.5,
            cadence_ms: 100,
            blur_sigma: 1.1,
            edge_strategy: EdgeStrategy::Gradient,
            canny_low: 50.0,
            canny_high: 150.0,
            adaptive_block_radius: 15,
            adaptive_offset: 10,
            closing_radius: 1,
            min_area_ratio: 0.05,
            approx_epsilon_ratio: 0.02,
            weights: ScoreWeights::default(),
            size_band: Band::new(0.10, 0.80),
            aspect_band: Band::new(0.3, 3.0),
            acceptance_threshold: 40.0,
            good_above: 60.0,
            excellent_above: 80.0,
        }
    }
}

impl DetectionConfig {
    /// Sampling cadence as a `Duration`.
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ScanError::InvalidConfig(msg));

        if !(self.downsample_factor.is_finite()
            && self.downsample_factor > 0.0
            && self.downsample_factor <= 1.0)
        {
            return invalid(format!(
                "downsample_factor must be in (0, 1], got {}",
                self.downsample_factor
            ));
        }
        if self.cadence_ms == 0 {
            return invalid("cadence_ms must be non-zero".into());
        }
        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return invalid(format!("blur_sigma must be positive, got {}", self.blur_sigma));
        }
        if !(self.canny_low.is_finite() && self.canny_high.is_finite())
            || self.canny_low > self.canny_high
        {
            return invalid(format!(
                "canny thresholds must satisfy low <= high, got {} / {}",
                self.canny_low, self.canny_high
            ));
        }
        for (name, ratio) in [
            ("min_area_ratio", self.min_area_ratio),
            ("approx_epsilon_ratio", self.approx_epsilon_ratio),
        ] {
            if !(ratio.is_finite() && ratio > 0.0 && ratio < 1.0) {
                return invalid(format!("{name} must be in (0, 1), got {ratio}"));
            }
        }
        for (name, band) in [("size_band", self.size_band), ("aspect_band", self.aspect_band)] {
            if !(band.min.is_finite() && band.max.is_finite()) || band.min >= band.max {
                return invalid(format!(
                    "{name} must satisfy min < max, got {} / {}",
                    band.min, band.max
                ));
            }
        }
        let w = self.weights;
        if [w.size, w.aspect, w.rectangularity, w.convexity]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return invalid("score weights must be finite and non-negative".into());
        }
        if !(self.acceptance_threshold <= self.good_above && self.good_above <= self.excellent_above)
        {
            return invalid(format!(
                "thresholds must be ordered: accept {} <= good {} <= excellent {}",
                self.acceptance_threshold, self.good_above, self.excellent_above
            ));
        }
        Ok(())
    }
}

/// Top-level scanner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Whether the live detection loop runs at all.
    pub detection_enabled: bool,
    pub detection: DetectionConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            detection_enabled: true,
            detection: DetectionConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Load and validate settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.detection.validate()?;
        Ok(config)
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
