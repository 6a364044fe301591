// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon approximator: reduces a closed contour to a minimal polygon with
// Douglas-Peucker and forwards only quadrilaterals.

use imageproc::geometry::contour_area;
use imageproc::point::Point;
use tracing::trace;

use super::contours::Contour;

/// A contour reduced to its significant vertices, in contour order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    vertices: Vec<Point<i32>>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point<i32>>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point<i32>] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The four vertices if this polygon is a quadrilateral.
    pub fn as_quad(&self) -> Option<Quad> {
        let v: [Point<i32>; 4] = self.vertices.as_slice().try_into().ok()?;
        Some(Quad(v))
    }
}

/// Four vertices in boundary order (not yet labelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad(pub [Point<i32>; 4]);

impl Quad {
    pub fn vertices(&self) -> &[Point<i32>; 4] {
        &self.0
    }

    /// Area of the quadrilateral itself (not of its source contour).
    pub fn area(&self) -> f64 {
        contour_area(&self.0)
    }

    /// Axis-aligned bounding box as `(min_x, min_y, width, height)`.
    pub fn bounding_box(&self) -> (i32, i32, i32, i32) {
        let xs = self.0.map(|p| p.x);
        let ys = self.0.map(|p| p.y);
        let min_x = xs.iter().copied().min().unwrap_or(0);
        let max_x = xs.iter().copied().max().unwrap_or(0);
        let min_y = ys.iter().copied().min().unwrap_or(0);
        let max_y = ys.iter().copied().max().unwrap_or(0);
        (min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Area gate and Douglas-Peucker reduction for one contour.
#[derive(Debug, Clone, Copy)]
pub struct PolygonApproximator {
    /// Contours enclosing less than this many pixels are rejected outright.
    min_area: f64,
    /// Tolerance as a fraction of the contour perimeter.
    epsilon_ratio: f64,
}

impl PolygonApproximator {
    pub fn new(frame_area: f64, min_area_ratio: f64, epsilon_ratio: f64) -> Self {
        Self {
            min_area: frame_area * min_area_ratio,
            epsilon_ratio,
        }
    }

    pub fn min_area(&self) -> f64 {
        self.min_area
    }

    /// Reduce a contour, or `None` if it is too small to be a document.
    pub fn approximate(&self, contour: &Contour) -> Option<Polygon> {
        if contour.enclosed_area() < self.min_area {
            trace!(
                area = contour.enclosed_area(),
                min_area = self.min_area,
                "Contour below area gate"
            );
            return None;
        }
        let epsilon = self.epsilon_ratio * contour.perimeter();
        Some(Polygon::new(approximate_closed(contour.points(), epsilon)))
    }
}

/// Douglas-Peucker reduction of a closed curve.
///
/// The curve is split at two extreme points (a diameter-like pair found from
/// the first point), each half is simplified as an open chain, and the halves
/// are joined without repeating the split points.
pub fn approximate_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    if points[a] == points[b] {
        return vec![points[a]];
    }

    // Rotate so the first anchor sits at index 0.
    let ring: Vec<Point<i32>> = (0..n).map(|i| points[(a + i) % n]).collect();
    let split = (b + n - a) % n;

    let mut result = simplify_open(&ring[..=split], epsilon);
    result.pop();

    let mut back: Vec<Point<i32>> = ring[split..].to_vec();
    back.push(ring[0]);
    let mut back = simplify_open(&back, epsilon);
    back.pop();

    result.extend(back);
    result
}

/// Douglas-Peucker on an open chain; both endpoints are always kept.
fn simplify_open(chain: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = chain.len();
    if n <= 2 {
        return chain.to_vec();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (idx, dist) = (start + 1..end)
            .map(|i| (i, segment_distance(chain[i], chain[start], chain[end])))
            .fold((start, 0.0f64), |best, cur| if cur.1 > best.1 { cur } else { best });

        if dist > epsilon {
            keep[idx] = true;
            stack.push((start, idx));
            stack.push((idx, end));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Index of the point farthest from `origin` (first one on ties).
fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    points
        .iter()
        .enumerate()
        .fold((0usize, -1.0f64), |best, (i, p)| {
            let d = squared_distance(*p, origin);
            if d > best.1 { (i, d) } else { best }
        })
        .0
}

fn squared_distance(a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx * dx + dy * dy
}

/// Perpendicular distance from `p` to the line through `a` and `b`, or the
/// point distance when `a == b`.
fn segment_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return squared_distance(p, a).sqrt();
    }
    ((p.x - a.x) as f64 * dy - (p.y - a.y) as f64 * dx).abs() / len
}
