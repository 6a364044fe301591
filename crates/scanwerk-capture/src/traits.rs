// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// What the detection loop needs from a live camera.
//
// Camera selection and permissions are the host's business. The loop only
// asks whether a frame is ready, how large it is, and how large it is drawn.

use image::DynamicImage;
use scanwerk_core::error::Result;
use scanwerk_core::types::DisplayGeometry;

/// A live video feed the detector can sample from.
pub trait VideoSource: Send + Sync {
    /// Whether frame metadata is available and a frame can be read.
    fn is_ready(&self) -> bool;

    /// Native frame size, or `None` before metadata arrives.
    fn native_size(&self) -> Option<(u32, u32)>;

    /// On-screen size of the video element. `None` means drawn at native size.
    fn display_size(&self) -> Option<(f64, f64)> {
        None
    }

    /// Snapshot of the current frame at native resolution.
    ///
    /// `Ok(None)` means "not decoded yet" and is not an error.
    /// `Err(ScanError::SourceUnavailable)` means the feed has gone away.
    fn current_frame(&self) -> Result<Option<DynamicImage>>;

    /// Native-to-overlay mapping, when the native size is known.
    fn display_geometry(&self) -> Option<DisplayGeometry> {
        let (native_width, native_height) = self.native_size()?;
        Some(match self.display_size() {
            Some((display_width, display_height)) => DisplayGeometry {
                native_width,
                native_height,
                display_width,
                display_height,
            },
            None => DisplayGeometry::identity(native_width, native_height),
        })
    }
}
