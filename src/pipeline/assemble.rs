//! Result assembly
//!
//! Turns a finished review pass into the run's two products: an
//! annotated image (best effort) and the timestamped output records.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::records::OutputRecord;
use crate::review::ReviewOutcome;
use crate::vision::Annotator;

/// Products of one run's assembly step.
#[derive(Debug, Default)]
pub struct AssembledResult {
    /// One record per accepted roll number, in review order.
    pub records: Vec<OutputRecord>,
    /// Path of the annotated image, when rendering happened and worked.
    pub annotated_image: Option<PathBuf>,
}

/// Assembles records and the annotated overlay from a review outcome.
pub struct ResultAssembler<'a> {
    annotator: &'a dyn Annotator,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(annotator: &'a dyn Annotator) -> Self {
        Self { annotator }
    }

    /// Runs the assembly step.
    ///
    /// Rendering is skipped when there is nothing to draw and degrades to
    /// a records-only result when the annotator fails; record creation is
    /// never blocked by visualization. Each record is stamped at the
    /// moment it is created.
    pub fn assemble(
        &self,
        image: &Path,
        outcome: &ReviewOutcome,
        annotated_path: &Path,
    ) -> AssembledResult {
        let annotated_image = if outcome.reviewed.is_empty() {
            debug!("No reviewed detections, nothing to visualize");
            None
        } else {
            let boxes: Vec<[(f32, f32); 4]> = outcome
                .reviewed
                .iter()
                .map(|r| r.detection.polygon)
                .collect();
            let texts: Vec<String> = outcome
                .reviewed
                .iter()
                .map(|r| r.accepted_text.clone())
                .collect();
            let scores: Vec<f32> = outcome
                .reviewed
                .iter()
                .map(|r| r.detection.confidence)
                .collect();

            match self
                .annotator
                .annotate(image, &boxes, &texts, &scores, annotated_path)
            {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Could not visualize OCR results: {:#}", e);
                    None
                }
            }
        };

        if outcome.roll_numbers.is_empty() {
            warn!("No valid 3-digit roll numbers found");
        }

        let records = outcome
            .roll_numbers
            .iter()
            .cloned()
            .map(OutputRecord::now)
            .collect();

        AssembledResult {
            records,
            annotated_image,
        }
    }
}
