// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection pipeline: frame sampling, edge extraction, external contour
// tracing, Douglas-Peucker reduction to quadrilaterals, multi-factor scoring,
// and corner labelling/rescaling.
//
// Stages run strictly in order within one pass and share no state across
// passes.

pub mod contours;
pub mod corners;
pub mod detector;
pub mod edges;
pub mod polygon;
pub mod sampler;
pub mod score;

pub use detector::{Detector, PassReport};
pub use edges::EdgeMap;
pub use sampler::{Frame, FrameSampler};
