// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: crop, rotate, tonal adjustment, and encoding of the captured
// photo after detection.

pub mod processor;

pub use processor::{Adjustments, ImageProcessor};
