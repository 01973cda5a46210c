//! Image preprocessing for OCR
//!
//! Cleans up photographed roll-call sheets before detection: grayscale
//! conversion, light Gaussian blur, and an unsharp-mask style combine
//! that boosts digit edges against the paper background.

use anyhow::{Context, Result};
use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The preprocessing collaborator.
///
/// Deterministic pixel filter; must never mutate the input file. The
/// output path is chosen by the caller so artifacts stay run-scoped.
pub trait Preprocessor {
    fn preprocess(&self, input: &Path, output: &Path) -> Result<PathBuf>;
}

/// Grayscale + blur + weighted sharpen filter.
///
/// Computes `1.5 * gray - 0.5 * blur(gray)` per pixel, clamped to u8.
pub struct SharpenFilter {
    /// Gaussian blur sigma; small values keep thin digit strokes intact.
    pub blur_sigma: f32,
    /// Weight applied to the grayscale image.
    pub sharpen_weight: f32,
    /// Weight subtracted for the blurred image.
    pub blur_weight: f32,
}

impl Default for SharpenFilter {
    fn default() -> Self {
        Self {
            blur_sigma: 0.8,
            sharpen_weight: 1.5,
            blur_weight: 0.5,
        }
    }
}

impl SharpenFilter {
    /// Applies the filter chain to an in-memory grayscale image.
    pub fn apply(&self, gray: &GrayImage) -> GrayImage {
        let blurred = image::imageops::blur(gray, self.blur_sigma);

        let mut out = GrayImage::new(gray.width(), gray.height());
        for (x, y, pixel) in gray.enumerate_pixels() {
            let g = pixel[0] as f32;
            let b = blurred.get_pixel(x, y)[0] as f32;
            let sharpened = (self.sharpen_weight * g - self.blur_weight * b).clamp(0.0, 255.0);
            out.put_pixel(x, y, Luma([sharpened as u8]));
        }
        out
    }
}

impl Preprocessor for SharpenFilter {
    fn preprocess(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        let img = image::open(input)
            .with_context(|| format!("Failed to load image {}", input.display()))?;
        let gray = img.to_luma8();

        debug!(
            "Preprocessing {} ({}x{}) -> {}",
            input.display(),
            gray.width(),
            gray.height(),
            output.display()
        );

        let sharpened = self.apply(&gray);
        sharpened
            .save(output)
            .with_context(|| format!("Failed to write preprocessed image {}", output.display()))?;

        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn flat_image(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |_, _| Luma([value]))
    }

    #[test]
    fn test_flat_region_is_preserved() {
        // On a flat image blur(x) == x, so 1.5x - 0.5x == x.
        let img = flat_image(8, 8, 100);
        let out = SharpenFilter::default().apply(&img);

        let center = out.get_pixel(4, 4)[0];
        assert!(
            (center as i16 - 100).abs() <= 1,
            "flat region changed: {}",
            center
        );
    }

    #[test]
    fn test_output_is_clamped() {
        let img = flat_image(4, 4, 255);
        let out = SharpenFilter::default().apply(&img);
        // 1.5*255 - 0.5*255 = 255, must not wrap
        assert_eq!(out.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_preprocess_does_not_mutate_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");

        flat_image(6, 6, 128).save(&input).unwrap();
        let before = std::fs::read(&input).unwrap();

        let written = SharpenFilter::default().preprocess(&input, &output).unwrap();

        assert_eq!(written, output);
        assert!(output.exists());
        assert_eq!(std::fs::read(&input).unwrap(), before);
    }

    #[test]
    fn test_preprocess_missing_input_fails() {
        let dir = tempdir().unwrap();
        let result = SharpenFilter::default()
            .preprocess(&dir.path().join("missing.png"), &dir.path().join("out.png"));
        assert!(result.is_err());
    }
}
