// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-capture image processor: crop (explicit or from a detection hint),
// rotation, tonal adjustments and encoding. No perspective correction.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::types::CropHint;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const JPEG_SAVE_QUALITY: u8 = 90;

/// Tonal adjustments applied in one per-pixel pass.
///
/// Saturation and hue use the standard luminance-preserving colour matrices;
/// brightness is additive and contrast scales around mid-grey.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    /// Added to every channel, clamped to -255..=255.
    pub brightness: i32,
    /// 1.0 is neutral.
    pub contrast: f32,
    /// 1.0 is neutral, 0.0 is fully desaturated.
    pub saturation: f32,
    /// Hue rotation in degrees.
    pub hue_degrees: f32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 0,
            contrast: 1.0,
            saturation: 1.0,
            hue_degrees: 0.0,
        }
    }
}

impl Adjustments {
    pub fn is_identity(&self) -> bool {
        self.brightness == 0
            && self.contrast == 1.0
            && self.saturation == 1.0
            && self.hue_degrees.rem_euclid(360.0) == 0.0
    }

    /// Combined hue-rotate x saturate matrix, or `None` when both are neutral.
    fn colour_matrix(&self) -> Option<[[f32; 3]; 3]> {
        if self.saturation == 1.0 && self.hue_degrees.rem_euclid(360.0) == 0.0 {
            return None;
        }
        Some(mat_mul(hue_matrix(self.hue_degrees), saturation_matrix(self.saturation)))
    }
}

fn saturation_matrix(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_matrix(degrees: f32) -> [[f32; 3]; 3] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn mat_mul(a: [[f32; 3]; 3], b: [[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut out = [[0.0f32; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Image processing pipeline operating on a single captured image.
///
/// Each transformation consumes `self` and returns a new processor, so calls
/// chain:
///
/// ```ignore
/// let png = ImageProcessor::open("capture.jpg")?
///     .crop_to_hint(&hint)
///     .rotate(90.0)
///     .adjust(&Adjustments { contrast: 1.2, ..Default::default() })
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ScanError::ImageError(format!("failed to open {}: {}", path.as_ref().display(), err))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from encoded bytes (JPEG, PNG, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| ScanError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate clockwise by `degrees`.
    ///
    /// Quarter turns are lossless. Other angles rotate about the centre with
    /// bilinear sampling on the original canvas; uncovered pixels become
    /// transparent white.
    #[instrument(skip(self))]
    pub fn rotate(self, degrees: f32) -> Self {
        let normalised = degrees.rem_euclid(360.0);
        let quarter = (normalised / 90.0).round();
        if (normalised - quarter * 90.0).abs() < 0.01 {
            let image = match quarter as u32 % 4 {
                1 => self.image.rotate90(),
                2 => self.image.rotate180(),
                3 => self.image.rotate270(),
                _ => self.image,
            };
            return Self { image };
        }

        let rotated: RgbaImage = geometric_transformations::rotate_about_center(
            &self.image.to_rgba8(),
            degrees.to_radians(),
            Interpolation::Bilinear,
            Rgba([255u8, 255, 255, 0]),
        );
        debug!("Arbitrary rotation applied");
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    /// Crop a rectangle with top-left `(x, y)`. The rectangle is clamped to
    /// the image bounds.
    #[instrument(skip(self))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let (img_w, img_h) = (self.image.width(), self.image.height());
        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w.saturating_sub(safe_x));
        let safe_h = height.min(img_h.saturating_sub(safe_y));

        info!(safe_x, safe_y, safe_w, safe_h, "Cropping image");
        Self {
            image: self.image.crop_imm(safe_x, safe_y, safe_w, safe_h),
        }
    }

    /// Crop to the bounding rectangle suggested by a detection.
    pub fn crop_to_hint(self, hint: &CropHint) -> Self {
        self.crop(hint.x, hint.y, hint.width, hint.height)
    }

    /// Apply brightness, contrast, saturation and hue in one pass.
    #[instrument(skip(self))]
    pub fn adjust(self, adjustments: &Adjustments) -> Self {
        if adjustments.is_identity() {
            return self;
        }

        let brightness = adjustments.brightness.clamp(-255, 255) as f32;
        let contrast = adjustments.contrast;
        let matrix = adjustments.colour_matrix();

        let mut rgba = self.image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            let mut rgb = [r as f32, g as f32, b as f32];
            if let Some(m) = matrix {
                let src = rgb;
                for (i, out) in rgb.iter_mut().enumerate() {
                    *out = m[i][0] * src[0] + m[i][1] * src[1] + m[i][2] * src[2];
                }
            }
            let tone = |v: f32| -> u8 {
                let v = (v + brightness).clamp(0.0, 255.0);
                (contrast * (v - 128.0) + 128.0).round().clamp(0.0, 255.0) as u8
            };
            *pixel = Rgba([tone(rgb[0]), tone(rgb[1]), tone(rgb[2]), a]);
        }

        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }

    // -- Output ---------------------------------------------------------------

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode as JPEG with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ScanError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write to a file; the format follows the extension. JPEG output drops
    /// alpha and uses quality 90.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        if matches!(ImageFormat::from_path(path.as_ref()), Ok(ImageFormat::Jpeg)) {
            std::fs::write(path.as_ref(), self.to_jpeg_bytes(JPEG_SAVE_QUALITY)?)?;
            return Ok(());
        }
        self.image.save(path.as_ref()).map_err(|err| {
            ScanError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ScanError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
