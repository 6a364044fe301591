// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language capture guidance derived from the latest detection.
//
// The overlay shows one short line under the viewfinder. A missing or poor
// detection never surfaces as an error, only as a hint to reposition.

use crate::types::{DetectedQuadrilateral, QualityTier};

/// What the capture screen should tell the user right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guidance {
    /// One-line message shown under the viewfinder.
    pub message: &'static str,
    /// Whether the detected outline is good enough to pre-place the crop.
    pub should_suggest_crop: bool,
}

/// Map the latest detection (or its absence) to user guidance.
pub fn guidance(detection: Option<&DetectedQuadrilateral>) -> Guidance {
    match detection.map(|d| d.quality) {
        None => Guidance {
            message: "No document found. Place it on a contrasting surface.",
            should_suggest_crop: false,
        },
        Some(QualityTier::Poor) => Guidance {
            message: "Document edges are unclear. Hold steady or move closer.",
            should_suggest_crop: false,
        },
        Some(QualityTier::Good) => Guidance {
            message: "Document found. Capture when ready.",
            should_suggest_crop: true,
        },
        Some(QualityTier::Excellent) => Guidance {
            message: "Document locked. Capture now.",
            should_suggest_crop: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CoordinateSpace, Corners, Point};

    fn detection(quality: QualityTier) -> DetectedQuadrilateral {
        let corners = Corners {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(10.0, 0.0),
            bottom_left: Point::new(0.0, 10.0),
            bottom_right: Point::new(10.0, 10.0),
        };
        DetectedQuadrilateral::new(corners, CoordinateSpace::Display, 50.0, quality)
    }

    #[test]
    fn no_detection_never_suggests_crop() {
        assert!(!guidance(None).should_suggest_crop);
    }

    #[test]
    fn poor_tier_asks_to_reposition() {
        let g = guidance(Some(&detection(QualityTier::Poor)));
        assert!(!g.should_suggest_crop);
        assert!(g.message.contains("unclear"));
    }

    #[test]
    fn good_and_excellent_suggest_crop() {
        assert!(guidance(Some(&detection(QualityTier::Good))).should_suggest_crop);
        assert!(guidance(Some(&detection(QualityTier::Excellent))).should_suggest_crop);
    }
}
