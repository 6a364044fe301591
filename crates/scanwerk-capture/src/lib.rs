// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-capture: live capture side of the scanner.
//
// `traits` defines what the detector needs from a camera, `stub` provides an
// in-memory still-image source, and `session` runs the cancelable sampling
// loop that publishes the latest detection.

pub mod session;
pub mod stub;
pub mod traits;

pub use session::{DetectionSession, TickOutcome, run_tick};
pub use stub::StillImageSource;
pub use traits::VideoSource;
