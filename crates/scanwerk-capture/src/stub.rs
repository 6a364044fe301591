// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory video source for the CLI, tests and desktop builds without a
// camera. It serves whatever still image it currently holds.

use std::sync::RwLock;

use image::DynamicImage;
use scanwerk_core::error::{Result, ScanError};
use tracing::debug;

use crate::traits::VideoSource;

/// A "camera" that always shows the same picture until it is replaced.
#[derive(Debug, Default)]
pub struct StillImageSource {
    frame: RwLock<Option<DynamicImage>>,
    display_size: RwLock<Option<(f64, f64)>>,
}

impl StillImageSource {
    /// Source that is ready immediately with `image`.
    pub fn new(image: DynamicImage) -> Self {
        Self {
            frame: RwLock::new(Some(image)),
            display_size: RwLock::new(None),
        }
    }

    /// Source with no frame yet; reports not ready.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the current frame.
    pub fn set_frame(&self, image: DynamicImage) -> Result<()> {
        let mut slot = self.frame.write().map_err(|_| lock_poisoned())?;
        debug!(width = image.width(), height = image.height(), "Still frame replaced");
        *slot = Some(image);
        Ok(())
    }

    /// Drop the current frame so the source reports not ready.
    pub fn clear(&self) -> Result<()> {
        *self.frame.write().map_err(|_| lock_poisoned())? = None;
        Ok(())
    }

    /// Pretend the video is drawn at `width` x `height` on screen.
    pub fn set_display_size(&self, width: f64, height: f64) -> Result<()> {
        *self.display_size.write().map_err(|_| lock_poisoned())? = Some((width, height));
        Ok(())
    }
}

fn lock_poisoned() -> ScanError {
    ScanError::Session("still image source lock poisoned".into())
}

impl VideoSource for StillImageSource {
    fn is_ready(&self) -> bool {
        self.native_size().is_some()
    }

    fn native_size(&self) -> Option<(u32, u32)> {
        let slot = self.frame.read().ok()?;
        slot.as_ref()
            .map(|img| (img.width(), img.height()))
            .filter(|&(w, h)| w > 0 && h > 0)
    }

    fn display_size(&self) -> Option<(f64, f64)> {
        *self.display_size.read().ok()?
    }

    fn current_frame(&self) -> Result<Option<DynamicImage>> {
        let slot = self.frame.read().map_err(|_| lock_poisoned())?;
        Ok(slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn empty_source_is_not_ready() {
        let source = StillImageSource::empty();
        assert!(!source.is_ready());
        assert_eq!(source.native_size(), None);
        assert!(source.display_geometry().is_none());
        assert!(source.current_frame().expect("read").is_none());
    }

    #[test]
    fn zero_sized_frame_is_not_ready() {
        let source = StillImageSource::new(DynamicImage::ImageRgba8(RgbaImage::new(0, 0)));
        assert!(!source.is_ready());
    }

    #[test]
    fn frames_can_be_swapped_and_cleared() {
        let source = StillImageSource::new(DynamicImage::ImageRgba8(RgbaImage::new(64, 48)));
        assert_eq!(source.native_size(), Some((64, 48)));

        source
            .set_frame(DynamicImage::ImageRgba8(RgbaImage::new(32, 16)))
            .expect("set");
        assert_eq!(source.native_size(), Some((32, 16)));

        source.clear().expect("clear");
        assert!(!source.is_ready());
    }

    #[test]
    fn display_geometry_defaults_to_native() {
        let source = StillImageSource::new(DynamicImage::ImageRgba8(RgbaImage::new(640, 480)));
        let geometry = source.display_geometry().expect("geometry");
        assert_eq!(geometry.ratio(), (1.0, 1.0));

        source.set_display_size(320.0, 240.0).expect("display size");
        let geometry = source.display_geometry().expect("geometry");
        assert_eq!(geometry.ratio(), (0.5, 0.5));
    }
}
