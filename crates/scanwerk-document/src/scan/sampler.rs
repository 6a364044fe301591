// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame sampler: downsamples a native video frame to the processing
// resolution the detector runs on.

use chrono::{DateTime, Utc};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use tracing::{debug, instrument};

/// An immutable processing-resolution snapshot of one video frame.
///
/// Owned by the pass that sampled it and dropped when that pass ends.
#[derive(Debug, Clone)]
pub struct Frame {
    image: DynamicImage,
    /// Scale applied to the native frame to obtain this one.
    downsample_factor: f64,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wrap an image that is already at processing resolution.
    pub fn new(image: DynamicImage, downsample_factor: f64) -> Self {
        Self {
            image,
            downsample_factor,
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Samples per pixel (1 for luma, 3 for RGB, 4 for RGBA).
    pub fn channels(&self) -> u8 {
        self.image.color().channel_count()
    }

    /// Pixel area of the processing frame.
    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }

    pub fn downsample_factor(&self) -> f64 {
        self.downsample_factor
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Single-channel luma conversion.
    pub fn to_luma(&self) -> GrayImage {
        self.image.to_luma8()
    }
}

/// Produces processing frames from native video frames at a fixed scale.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    downsample_factor: f64,
}

impl FrameSampler {
    pub fn new(downsample_factor: f64) -> Self {
        Self { downsample_factor }
    }

    pub fn downsample_factor(&self) -> f64 {
        self.downsample_factor
    }

    /// Processing-resolution size for a native frame, never below 1x1.
    pub fn target_size(&self, native_width: u32, native_height: u32) -> (u32, u32) {
        let scale = |v: u32| ((v as f64 * self.downsample_factor).round() as u32).max(1);
        (scale(native_width), scale(native_height))
    }

    /// Downsample a native frame.
    ///
    /// Returns `None` for an empty frame, which the caller treats as "source
    /// not ready yet" rather than an error.
    #[instrument(skip_all, fields(native_w = native.width(), native_h = native.height()))]
    pub fn sample(&self, native: &DynamicImage) -> Option<Frame> {
        if native.width() == 0 || native.height() == 0 {
            debug!("Empty native frame; skipping sample");
            return None;
        }

        let (w, h) = self.target_size(native.width(), native.height());
        let image = if (w, h) == (native.width(), native.height()) {
            native.clone()
        } else {
            native.resize_exact(w, h, FilterType::Triangle)
        };
        debug!(w, h, "Frame sampled");

        Some(Frame::new(image, self.downsample_factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn half_scale_halves_dimensions() {
        let native = DynamicImage::ImageRgba8(RgbaImage::from_pixel(640, 480, Rgba([9, 9, 9, 255])));
        let frame = FrameSampler::new(0.5).sample(&native).expect("frame");
        assert_eq!((frame.width(), frame.height()), (320, 240));
        assert_eq!(frame.channels(), 4);
        assert_eq!(frame.downsample_factor(), 0.5);
    }

    #[test]
    fn empty_frame_is_not_ready() {
        let native = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(FrameSampler::new(0.5).sample(&native).is_none());
    }

    #[test]
    fn tiny_frame_never_collapses_to_zero() {
        assert_eq!(FrameSampler::new(0.1).target_size(3, 1), (1, 1));
    }

    #[test]
    fn unit_factor_keeps_pixels() {
        let mut native = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        native.put_pixel(3, 4, Rgba([255, 255, 255, 255]));
        let frame = FrameSampler::new(1.0)
            .sample(&DynamicImage::ImageRgba8(native))
            .expect("frame");
        assert_eq!(frame.to_luma().get_pixel(3, 4).0[0], 255);
    }
}
