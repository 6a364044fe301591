// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge extraction: grayscale, Gaussian blur, binary edge signal (Canny,
// optionally preceded by a local-mean adaptive threshold), then a
// morphological closing so document borders form closed loops.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use scanwerk_core::config::{DetectionConfig, EdgeStrategy};
use scanwerk_core::error::{Result, ScanError};
use tracing::{debug, instrument};

use super::sampler::Frame;

/// Smallest frame edge the gradient operators can run on.
const MIN_FRAME_EDGE: u32 = 3;

/// Binary edge image (0 = background, 255 = edge) at processing resolution.
#[derive(Debug, Clone)]
pub struct EdgeMap {
    pixels: GrayImage,
}

impl EdgeMap {
    /// Build from any grayscale image; every non-zero pixel becomes an edge.
    pub fn from_gray(mut pixels: GrayImage) -> Self {
        for p in pixels.pixels_mut() {
            if p.0[0] != 0 {
                p.0[0] = 255;
            }
        }
        Self { pixels }
    }

    /// Blank map with no edges.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }

    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y).0[0] != 0
    }

    /// Mark a single pixel as an edge. Out-of-bounds writes are ignored.
    pub fn set_edge(&mut self, x: u32, y: u32) {
        if x < self.width() && y < self.height() {
            self.pixels.put_pixel(x, y, Luma([255]));
        }
    }

    /// Count of edge pixels.
    pub fn edge_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[0] != 0).count()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }
}

/// Run the full edge extraction on a processing frame.
#[instrument(skip_all, fields(w = frame.width(), h = frame.height(), strategy = ?config.edge_strategy))]
pub fn extract_edges(frame: &Frame, config: &DetectionConfig) -> Result<EdgeMap> {
    if frame.width() < MIN_FRAME_EDGE || frame.height() < MIN_FRAME_EDGE {
        return Err(ScanError::Processing(format!(
            "frame {}x{} is too small for edge extraction",
            frame.width(),
            frame.height()
        )));
    }

    let gray = frame.to_luma();
    let blurred = gaussian_blur_f32(&gray, config.blur_sigma);

    let edges = match config.edge_strategy {
        EdgeStrategy::Gradient => canny(&blurred, config.canny_low, config.canny_high),
        EdgeStrategy::AdaptiveThreshold => {
            let binary =
                adaptive_threshold(&blurred, config.adaptive_block_radius, config.adaptive_offset);
            canny(&binary, config.canny_low, config.canny_high)
        }
    };

    let closed = if config.closing_radius > 0 {
        close(&edges, Norm::LInf, config.closing_radius)
    } else {
        edges
    };

    let map = EdgeMap::from_gray(closed);
    debug!(edge_pixels = map.edge_count(), "Edge map extracted");
    Ok(map)
}

/// Local-mean adaptive threshold.
///
/// Each pixel is compared against the mean of its `block_radius`
/// neighbourhood minus `offset`: darker pixels become 0, others 255.
pub fn adaptive_threshold(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = compute_integral_image(gray);

    GrayImage::from_fn(width, height, |x, y| {
        let local_mean = region_mean(&integral, width, height, x, y, block_radius);
        let threshold = (local_mean as i32 - offset).clamp(0, 255) as u8;
        if gray.get_pixel(x, y).0[0] < threshold {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

// -- Integral image helpers ---------------------------------------------------

/// Summed-area table with a zero-padded first row and column:
/// `table[y * (w+1) + x]` is the sum over `[0, x) x [0, y)`.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean over the square of `radius` around (cx, cy), clamped to the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx as usize + radius as usize + 1).min(img_width as usize);
    let y2 = (cy as usize + radius as usize + 1).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn card_frame(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Frame {
        let mut img = GrayImage::from_pixel(w, h, Luma([30u8]));
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([230u8]));
            }
        }
        Frame::new(DynamicImage::ImageLuma8(img), 1.0)
    }

    #[test]
    fn uniform_frame_has_no_edges() {
        let frame = Frame::new(
            DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 48, Luma([128u8]))),
            1.0,
        );
        let map = extract_edges(&frame, &DetectionConfig::default()).expect("edges");
        assert_eq!(map.edge_count(), 0);
    }

    #[test]
    fn card_border_produces_edges_only_near_border() {
        let frame = card_frame(120, 100, 20, 15, 100, 85);
        let map = extract_edges(&frame, &DetectionConfig::default()).expect("edges");
        assert!(map.edge_count() > 0);
        // Centre of the card and far background stay clear.
        assert!(!map.is_edge(60, 50));
        assert!(!map.is_edge(2, 2));
        // Somewhere on the left border column there is an edge.
        assert!((17..23).any(|x| map.is_edge(x, 50)));
    }

    #[test]
    fn adaptive_strategy_also_finds_border() {
        let frame = card_frame(120, 100, 20, 15, 100, 85);
        let config = DetectionConfig {
            edge_strategy: EdgeStrategy::AdaptiveThreshold,
            ..Default::default()
        };
        let map = extract_edges(&frame, &config).expect("edges");
        assert!((17..23).any(|x| map.is_edge(x, 50)));
        assert!(!map.is_edge(60, 50));
    }

    #[test]
    fn tiny_frame_is_processing_error() {
        let frame = Frame::new(DynamicImage::ImageLuma8(GrayImage::new(2, 2)), 1.0);
        assert!(matches!(
            extract_edges(&frame, &DetectionConfig::default()),
            Err(ScanError::Processing(_))
        ));
    }

    #[test]
    fn from_gray_binarizes() {
        let mut img = GrayImage::new(4, 4);
        img.put_pixel(1, 1, Luma([7u8]));
        let map = EdgeMap::from_gray(img);
        assert!(map.is_edge(1, 1));
        assert_eq!(map.as_gray().get_pixel(1, 1).0[0], 255);
        assert_eq!(map.edge_count(), 1);
    }

    #[test]
    fn adaptive_threshold_splits_dark_and_light() {
        let mut img = GrayImage::from_pixel(40, 40, Luma([220u8]));
        for y in 0..40 {
            for x in 0..20 {
                img.put_pixel(x, y, Luma([20u8]));
            }
        }
        let out = adaptive_threshold(&img, 5, 10);
        // Dark pixel next to the boundary is below the local mean.
        assert_eq!(out.get_pixel(18, 20).0[0], 0);
        // Uniform light region is at or above its own mean.
        assert_eq!(out.get_pixel(35, 20).0[0], 255);
    }
}
