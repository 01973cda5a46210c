//! OCR detection types and the detector seam
//!
//! The OCR engine itself is an external collaborator. This module defines
//! the detection data it produces and the trait the pipeline calls it
//! through, plus scripted implementations for tests.

use anyhow::Result;
use std::path::Path;

/// Single OCR detection: one recognized text token.
///
/// Immutable once produced; the review pass creates corrected copies
/// rather than mutating detections, so the raw OCR output stays available
/// for audit.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Bounding quadrilateral in image pixel coordinates
    pub polygon: [(f32, f32); 4],
    /// Recognized text
    pub text: String,
    /// Recognition confidence in [0, 1]
    pub confidence: f32,
}

impl Detection {
    pub fn new(polygon: [(f32, f32); 4], text: impl Into<String>, confidence: f32) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence,
        }
    }
}

/// Detections the OCR engine judged to be on the same text line.
///
/// Order within a line and across lines is emission order from the
/// engine, not spatial reading order. Nothing in this crate re-sorts it.
#[derive(Debug, Clone, Default)]
pub struct DetectionLine {
    pub detections: Vec<Detection>,
}

impl DetectionLine {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

/// The OCR collaborator: one image in, detection lines out.
///
/// Called exactly once per pipeline run. An empty result is valid (blank
/// sheet), not an error.
pub trait TextDetector {
    fn detect(&mut self, image: &Path) -> Result<Vec<DetectionLine>>;
}

/// Detector double that replays a fixed detection set.
///
/// Counts invocations so tests can assert the one-call-per-run guarantee.
#[cfg(test)]
pub struct ScriptedDetector {
    lines: Vec<DetectionLine>,
    pub calls: usize,
}

#[cfg(test)]
impl ScriptedDetector {
    pub fn new(lines: Vec<DetectionLine>) -> Self {
        Self { lines, calls: 0 }
    }
}

#[cfg(test)]
impl TextDetector for ScriptedDetector {
    fn detect(&mut self, _image: &Path) -> Result<Vec<DetectionLine>> {
        self.calls += 1;
        Ok(self.lines.clone())
    }
}

/// Detector double that always fails, for fatal-error paths.
#[cfg(test)]
pub struct FailingDetector;

#[cfg(test)]
impl TextDetector for FailingDetector {
    fn detect(&mut self, image: &Path) -> Result<Vec<DetectionLine>> {
        anyhow::bail!("OCR engine did not return for {}", image.display())
    }
}

/// Builds a detection with a synthetic bounding box.
///
/// Constructor helper for tests and doubles.
#[cfg(test)]
pub fn detection(text: &str, confidence: f32) -> Detection {
    Detection::new(
        [(0.0, 0.0), (60.0, 0.0), (60.0, 20.0), (0.0, 20.0)],
        text,
        confidence,
    )
}
