// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk document detector.

use serde::{Deserialize, Serialize};

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale each axis independently.
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Which pixel grid a set of coordinates refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateSpace {
    /// The downsampled frame the detector actually ran on.
    Processing,
    /// Full native video resolution.
    Native,
    /// On-screen overlay resolution.
    Display,
}

/// The four labelled corners of a document quadrilateral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Corners {
    /// Corners in drawing order: top-left, top-right, bottom-right, bottom-left.
    pub fn as_array(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Apply the same transform to every corner.
    pub fn map(self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_left: f(self.bottom_left),
            bottom_right: f(self.bottom_right),
        }
    }

    /// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.as_array().iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        )
    }
}

/// Three-level bucket derived from the composite detection score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Poor,
    Good,
    Excellent,
}

impl QualityTier {
    /// Lowercase label used in logs and JSON output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Final output of one successful detection pass.
///
/// Immutable once built; a newer pass replaces it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedQuadrilateral {
    pub corners: Corners,
    /// Coordinate space the corners are expressed in.
    pub space: CoordinateSpace,
    /// Composite score in [0, 100].
    pub score: f64,
    /// `score / 100`, clamped to [0, 1].
    pub confidence: f64,
    pub quality: QualityTier,
}

impl DetectedQuadrilateral {
    pub fn new(corners: Corners, space: CoordinateSpace, score: f64, quality: QualityTier) -> Self {
        Self {
            corners,
            space,
            score,
            confidence: (score / 100.0).clamp(0.0, 1.0),
            quality,
        }
    }

    /// Axis-aligned crop suggestion for the cropper, clamped to a
    /// `width` x `height` image in the same coordinate space.
    ///
    /// Returns `None` when the clamped rectangle is empty.
    pub fn crop_hint(&self, width: u32, height: u32) -> Option<CropHint> {
        let (min_x, min_y, max_x, max_y) = self.corners.bounds();
        let x0 = min_x.floor().clamp(0.0, width as f64) as u32;
        let y0 = min_y.floor().clamp(0.0, height as f64) as u32;
        let x1 = max_x.ceil().clamp(0.0, width as f64) as u32;
        let y1 = max_y.ceil().clamp(0.0, height as f64) as u32;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(CropHint {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// One-shot initial crop placement handed from capture to the cropper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropHint {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Relationship between the video's native resolution and its on-screen size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub native_width: u32,
    pub native_height: u32,
    pub display_width: f64,
    pub display_height: f64,
}

impl DisplayGeometry {
    /// Geometry where the overlay is drawn at native resolution.
    pub fn identity(width: u32, height: u32) -> Self {
        Self {
            native_width: width,
            native_height: height,
            display_width: width as f64,
            display_height: height as f64,
        }
    }

    /// Per-axis display/native ratio. Zero-sized native dimensions map to 1.0.
    pub fn ratio(&self) -> (f64, f64) {
        let rx = if self.native_width == 0 {
            1.0
        } else {
            self.display_width / self.native_width as f64
        };
        let ry = if self.native_height == 0 {
            1.0
        } else {
            self.display_height / self.native_height as f64
        };
        (rx, ry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Corners {
        Corners {
            top_left: Point::new(10.0, 20.0),
            top_right: Point::new(110.0, 22.0),
            bottom_left: Point::new(8.0, 220.0),
            bottom_right: Point::new(112.5, 218.0),
        }
    }

    #[test]
    fn confidence_tracks_score() {
        let det = DetectedQuadrilateral::new(
            square(),
            CoordinateSpace::Processing,
            73.0,
            QualityTier::Good,
        );
        assert!((det.confidence - 0.73).abs() < 1e-9);
    }

    #[test]
    fn crop_hint_covers_all_corners() {
        let det = DetectedQuadrilateral::new(
            square(),
            CoordinateSpace::Native,
            90.0,
            QualityTier::Excellent,
        );
        let hint = det.crop_hint(640, 480).expect("non-empty hint");
        assert_eq!(hint, CropHint { x: 8, y: 20, width: 105, height: 200 });
    }

    #[test]
    fn crop_hint_is_clamped_to_frame() {
        let corners = square().map(|p| p.scale(10.0, 10.0));
        let det = DetectedQuadrilateral::new(
            corners,
            CoordinateSpace::Native,
            90.0,
            QualityTier::Excellent,
        );
        let hint = det.crop_hint(640, 480).expect("non-empty hint");
        assert_eq!(hint.x + hint.width, 640);
        assert_eq!(hint.y + hint.height, 480);
    }

    #[test]
    fn crop_hint_outside_frame_is_none() {
        let corners = square().map(|p| Point::new(p.x + 5000.0, p.y));
        let det = DetectedQuadrilateral::new(
            corners,
            CoordinateSpace::Native,
            50.0,
            QualityTier::Poor,
        );
        assert!(det.crop_hint(640, 480).is_none());
    }

    #[test]
    fn display_ratio_handles_zero_native() {
        let geometry = DisplayGeometry {
            native_width: 0,
            native_height: 720,
            display_width: 320.0,
            display_height: 360.0,
        };
        assert_eq!(geometry.ratio(), (1.0, 0.5));
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_string(&QualityTier::Excellent).expect("serialize");
        assert_eq!(json, "\"excellent\"");
    }
}
