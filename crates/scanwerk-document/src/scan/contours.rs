// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour finder: traces the outermost closed boundaries of an edge map.
//
// Border following is delegated to `imageproc::contours::find_contours`
// (Suzuki-Abe). Only top-level outer borders are kept; holes and anything
// nested inside them are ignored since a document is judged by its outer
// silhouette alone.

use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::{arc_length, contour_area};
use imageproc::point::Point;

use super::edges::EdgeMap;

/// A traced closed boundary in processing-resolution pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<Point<i32>>,
    enclosed_area: f64,
    perimeter: f64,
}

impl Contour {
    /// Build a contour from an ordered, implicitly closed point sequence.
    pub fn new(points: Vec<Point<i32>>) -> Self {
        let enclosed_area = contour_area(&points);
        let perimeter = if points.len() < 2 {
            0.0
        } else {
            arc_length(&points, true)
        };
        Self {
            points,
            enclosed_area,
            perimeter,
        }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Unsigned area enclosed by the boundary polygon.
    pub fn enclosed_area(&self) -> f64 {
        self.enclosed_area
    }

    /// Closed perimeter length.
    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }
}

/// Lazily yield the external contours of an edge map in discovery order.
///
/// An edge map with no closed boundaries yields nothing.
pub fn external_contours(edges: &EdgeMap) -> impl Iterator<Item = Contour> {
    find_contours::<i32>(edges.as_gray())
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| c.points.len() >= 3)
        .map(|c| Contour::new(c.points))
}
