// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document: Document detection for the Scanwerk scanner.
//
// Provides the frame-analysis pipeline (sampling, edge extraction, contour
// tracing, polygon approximation, candidate scoring, corner labelling and
// rescaling) and a post-capture image processor (crop, rotate, tonal
// adjustments, encoding).

pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `scanwerk_document::Detector` etc.
pub use crate::image::processor::{Adjustments, ImageProcessor};
pub use scan::detector::{Detector, PassReport};
pub use scan::edges::EdgeMap;
pub use scan::sampler::{Frame, FrameSampler};
