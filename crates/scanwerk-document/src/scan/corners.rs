// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner labelling and coordinate rescaling for an accepted quadrilateral.
//
// Labelling uses the coordinate-sum heuristic, which assumes the document is
// within roughly 45 degrees of axis-aligned. Steeper rotations can mislabel.

use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::types::{CoordinateSpace, Corners, DetectedQuadrilateral, DisplayGeometry, Point};

/// Assign top-left / top-right / bottom-left / bottom-right roles to four
/// unordered vertices.
///
/// The smallest `x + y` is top-left and the largest is bottom-right. Of the
/// other two, the one above the vertical midpoint of those two is top-right.
/// If both sit on the same side of the midpoint, the smaller `x` becomes
/// bottom-left.
pub fn label_corners(points: [Point; 4]) -> Corners {
    let mut sorted = points;
    sorted.sort_by(|a, b| (a.x + a.y).total_cmp(&(b.x + b.y)));

    let top_left = sorted[0];
    let bottom_right = sorted[3];
    let (p, q) = (sorted[1], sorted[2]);
    let mid_y = (top_left.y + bottom_right.y) / 2.0;

    let (top_right, bottom_left) = match (p.y < mid_y, q.y < mid_y) {
        (true, false) => (p, q),
        (false, true) => (q, p),
        _ if p.x < q.x => (q, p),
        _ => (p, q),
    };

    Corners {
        top_left,
        top_right,
        bottom_left,
        bottom_right,
    }
}

/// Map a processing-space detection back to native video resolution by
/// dividing by the sampler's downsample factor.
pub fn rescale_to_native(
    detection: &DetectedQuadrilateral,
    downsample_factor: f64,
) -> Result<DetectedQuadrilateral> {
    expect_space(detection, CoordinateSpace::Processing)?;
    if !(downsample_factor.is_finite() && downsample_factor > 0.0) {
        return Err(ScanError::Processing(format!(
            "cannot rescale by downsample factor {downsample_factor}"
        )));
    }
    let inv = 1.0 / downsample_factor;
    Ok(DetectedQuadrilateral {
        corners: detection.corners.map(|p| p.scale(inv, inv)),
        space: CoordinateSpace::Native,
        ..*detection
    })
}

/// Map a native-space detection onto the on-screen overlay.
pub fn rescale_to_display(
    detection: &DetectedQuadrilateral,
    geometry: &DisplayGeometry,
) -> Result<DetectedQuadrilateral> {
    expect_space(detection, CoordinateSpace::Native)?;
    let (rx, ry) = geometry.ratio();
    Ok(DetectedQuadrilateral {
        corners: detection.corners.map(|p| p.scale(rx, ry)),
        space: CoordinateSpace::Display,
        ..*detection
    })
}

fn expect_space(detection: &DetectedQuadrilateral, expected: CoordinateSpace) -> Result<()> {
    if detection.space == expected {
        Ok(())
    } else {
        Err(ScanError::Processing(format!(
            "expected {expected:?} coordinates, got {:?}",
            detection.space
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::types::QualityTier;

    fn pts(raw: [(f64, f64); 4]) -> [Point; 4] {
        raw.map(|(x, y)| Point::new(x, y))
    }

    #[test]
    fn unit_square_is_labelled_correctly() {
        let c = label_corners(pts([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]));
        assert_eq!(c.top_left, Point::new(0.0, 0.0));
        assert_eq!(c.top_right, Point::new(10.0, 0.0));
        assert_eq!(c.bottom_left, Point::new(0.0, 10.0));
        assert_eq!(c.bottom_right, Point::new(10.0, 10.0));
    }

    #[test]
    fn input_order_does_not_matter() {
        let expected = label_corners(pts([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]));
        let shuffled = label_corners(pts([(10.0, 10.0), (0.0, 10.0), (10.0, 0.0), (0.0, 0.0)]));
        assert_eq!(expected, shuffled);
    }

    #[test]
    fn slightly_rotated_card() {
        let c = label_corners(pts([(120.0, 90.0), (680.0, 130.0), (650.0, 860.0), (90.0, 820.0)]));
        assert_eq!(c.top_left, Point::new(120.0, 90.0));
        assert_eq!(c.top_right, Point::new(680.0, 130.0));
        assert_eq!(c.bottom_right, Point::new(650.0, 860.0));
        assert_eq!(c.bottom_left, Point::new(90.0, 820.0));
    }

    #[test]
    fn same_side_of_midpoint_falls_back_to_x() {
        // Both middle points sit below the TL/BR midpoint (y = 5).
        let c = label_corners(pts([(0.0, 0.0), (2.0, 8.0), (9.0, 6.0), (10.0, 10.0)]));
        assert_eq!(c.bottom_left, Point::new(2.0, 8.0));
        assert_eq!(c.top_right, Point::new(9.0, 6.0));
    }

    fn processing_detection() -> DetectedQuadrilateral {
        let corners = label_corners(pts([
            (100.0, 100.0),
            (300.0, 100.0),
            (100.0, 400.0),
            (300.0, 400.0),
        ]));
        DetectedQuadrilateral::new(corners, CoordinateSpace::Processing, 92.0, QualityTier::Excellent)
    }

    #[test]
    fn half_scale_doubles_into_native_and_display() {
        let det = processing_detection();
        let native = rescale_to_native(&det, 0.5).expect("native");
        assert_eq!(native.space, CoordinateSpace::Native);
        assert_eq!(native.corners.top_left, Point::new(200.0, 200.0));

        let display = rescale_to_display(&native, &DisplayGeometry::identity(1280, 720))
            .expect("display");
        assert_eq!(display.space, CoordinateSpace::Display);
        assert_eq!(display.corners.top_left, Point::new(200.0, 200.0));
        assert_eq!(display.score, det.score);
        assert_eq!(display.quality, det.quality);
    }

    #[test]
    fn display_scaling_is_per_axis() {
        let native = rescale_to_native(&processing_detection(), 0.5).expect("native");
        let geometry = DisplayGeometry {
            native_width: 1280,
            native_height: 720,
            display_width: 640.0,
            display_height: 540.0,
        };
        let display = rescale_to_display(&native, &geometry).expect("display");
        assert_eq!(display.corners.bottom_right, Point::new(300.0, 600.0));
    }

    #[test]
    fn wrong_space_is_rejected() {
        let det = processing_detection();
        assert!(rescale_to_display(&det, &DisplayGeometry::identity(10, 10)).is_err());
        let native = rescale_to_native(&det, 0.5).expect("native");
        assert!(rescale_to_native(&native, 0.5).is_err());
        assert!(rescale_to_native(&det, 0.0).is_err());
    }
}
