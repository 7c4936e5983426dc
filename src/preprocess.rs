//! Image preprocessing for OCR
//!
//! Scanned drawings are normalized to a single luminance channel and given a
//! contrast boost before recognition. Thin dimension text on faded scans is
//! the main thing this helps with.
//!
//! The transform is deterministic. It is NOT idempotent on its own output:
//! the grayscale step becomes a no-op but the contrast boost compounds, so
//! run it exactly once per image handed to the recognizer.

use std::str::FromStr;

use image::{DynamicImage, GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// Default contrast multiplier
pub const DEFAULT_CONTRAST_FACTOR: f32 = 2.0;

/// Value contrast is stretched around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContrastPivot {
    /// Fixed channel midpoint (128)
    #[default]
    Midpoint,
    /// Mean luminance of the image being enhanced
    Mean,
}

impl FromStr for ContrastPivot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "midpoint" | "mid" => Ok(Self::Midpoint),
            "mean" | "average" => Ok(Self::Mean),
            other => Err(format!("unknown contrast pivot '{}'", other)),
        }
    }
}

/// Preprocessing settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Contrast multiplier (1.0 leaves the image unchanged)
    pub contrast_factor: f32,
    /// Value contrast is stretched around
    pub pivot: ContrastPivot,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            contrast_factor: DEFAULT_CONTRAST_FACTOR,
            pivot: ContrastPivot::Midpoint,
        }
    }
}

/// Grayscale + contrast normalizer
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Convert to grayscale and enhance contrast
    pub fn preprocess(&self, image: &DynamicImage) -> GrayImage {
        let mut gray = to_grayscale(image);
        if (self.config.contrast_factor - 1.0).abs() > f32::EPSILON {
            let pivot = match self.config.pivot {
                ContrastPivot::Midpoint => 128.0,
                ContrastPivot::Mean => mean_luminance(&gray),
            };
            apply_contrast(&mut gray, self.config.contrast_factor, pivot);
        }
        gray
    }
}

/// Single-channel copy of the image
///
/// Uses ITU-R 601-2 luma weights; alpha is ignored. Images that are already
/// single-channel 8-bit are copied as-is.
fn to_grayscale(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (src, dst) in rgb.pixels().zip(gray.pixels_mut()) {
        let [r, g, b] = src.0;
        let luma = (299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b) + 500) / 1000;
        *dst = Luma([luma as u8]);
    }
    gray
}

fn mean_luminance(gray: &GrayImage) -> f32 {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 128.0;
    }
    let sum: u64 = pixels.iter().map(|&v| u64::from(v)).sum();
    (sum as f64 / pixels.len() as f64).round() as f32
}

/// Stretch values around `pivot` by `factor`, clamping to 0..=255
fn apply_contrast(gray: &mut GrayImage, factor: f32, pivot: f32) {
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let adjusted = (value as f32 - pivot) * factor + pivot;
        *slot = adjusted.round().clamp(0.0, 255.0) as u8;
    }
    for pixel in gray.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
}
