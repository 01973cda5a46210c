//! Annotated output rendering
//!
//! Draws the reviewed detections back onto the image: hollow bounding
//! quadrilaterals plus optional text labels with the accepted token and
//! its confidence. Rendering is best-effort; the pipeline degrades to a
//! records-only result when it fails.

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::Rgb;
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};
use std::path::{Path, PathBuf};
use tracing::debug;

const BOX_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([220, 0, 0]);

/// The rendering collaborator: called 0 or 1 times per run.
///
/// `boxes`, `texts` and `scores` are parallel slices in detection order.
pub trait Annotator {
    fn annotate(
        &self,
        image: &Path,
        boxes: &[[(f32, f32); 4]],
        texts: &[String],
        scores: &[f32],
        output: &Path,
    ) -> Result<PathBuf>;
}

/// Box-and-label renderer backed by `imageproc` drawing.
pub struct BoxAnnotator {
    /// Font for text labels. Without one, boxes are still drawn and
    /// labels are skipped.
    font: Option<FontVec>,
    font_scale: f32,
}

impl BoxAnnotator {
    pub fn new() -> Self {
        Self {
            font: None,
            font_scale: 16.0,
        }
    }

    /// Loads a TTF/OTF font for labels from the given path.
    pub fn with_font_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|e| anyhow::anyhow!("Failed to parse font {}: {}", path.display(), e))?;
        Ok(Self {
            font: Some(font),
            font_scale: 16.0,
        })
    }
}

impl Default for BoxAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator for BoxAnnotator {
    fn annotate(
        &self,
        image: &Path,
        boxes: &[[(f32, f32); 4]],
        texts: &[String],
        scores: &[f32],
        output: &Path,
    ) -> Result<PathBuf> {
        let mut canvas = image::open(image)
            .with_context(|| format!("Failed to load image {}", image.display()))?
            .to_rgb8();

        for ((quad, text), score) in boxes.iter().zip(texts).zip(scores) {
            for i in 0..4 {
                let start = quad[i];
                let end = quad[(i + 1) % 4];
                draw_line_segment_mut(&mut canvas, start, end, BOX_COLOR);
            }

            if let Some(font) = &self.font {
                let label = format!("{} ({:.2})", text, score);
                let (x, y) = quad[0];
                draw_text_mut(
                    &mut canvas,
                    LABEL_COLOR,
                    x as i32,
                    (y as i32 - self.font_scale as i32).max(0),
                    PxScale::from(self.font_scale),
                    font,
                    &label,
                );
            }
        }

        debug!(
            "Annotated {} detections onto {}",
            boxes.len(),
            output.display()
        );
        canvas
            .save(output)
            .with_context(|| format!("Failed to write annotated image {}", output.display()))?;

        Ok(output.to_path_buf())
    }
}

/// Annotator that declines every render request.
///
/// Used when annotation is disabled; the pipeline degrades to a
/// records-only result, same as any other renderer failure.
pub struct NullAnnotator;

impl Annotator for NullAnnotator {
    fn annotate(
        &self,
        _image: &Path,
        _boxes: &[[(f32, f32); 4]],
        _texts: &[String],
        _scores: &[f32],
        _output: &Path,
    ) -> Result<PathBuf> {
        anyhow::bail!("annotation disabled")
    }
}
