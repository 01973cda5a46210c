//! Run-level error taxonomy
//!
//! Only conditions fatal to a run are errors. Zero detections and zero
//! valid roll numbers are reported states, not errors, and live in the
//! run report instead; remediation differs for each and the operator
//! message must say which one happened.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors for a single pipeline run. Run-local by construction;
/// nothing here affects other runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Batch year was not exactly 4 decimal digits. The run is rejected
    /// before any collaborator is called.
    #[error("Invalid batch year '{0}': expected exactly 4 digits")]
    InvalidBatchYear(String),

    /// Input image path does not point at a readable file. Rejected
    /// before any collaborator is called.
    #[error("Image not found: {0}")]
    MissingImage(PathBuf),

    /// The preprocessing collaborator failed.
    #[error("Image preprocessing failed")]
    Preprocess(#[source] anyhow::Error),

    /// The OCR collaborator failed or did not return. Fatal to the run,
    /// never retried; a fresh image submission starts a new run.
    #[error("Text detection failed")]
    Detection(#[source] anyhow::Error),

    /// CSV export of the assembled records failed.
    #[error("Record export failed")]
    Export(#[source] anyhow::Error),
}

impl PipelineError {
    /// True for rejections that happen before any collaborator runs.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidBatchYear(_) | PipelineError::MissingImage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(PipelineError::InvalidBatchYear("24".into()).is_rejection());
        assert!(PipelineError::MissingImage(PathBuf::from("x.png")).is_rejection());
        assert!(!PipelineError::Detection(anyhow::anyhow!("boom")).is_rejection());
    }

    #[test]
    fn test_messages_identify_the_bad_input() {
        let err = PipelineError::InvalidBatchYear("24".into());
        assert!(err.to_string().contains("24"));

        let err = PipelineError::MissingImage(PathBuf::from("sheet.png"));
        assert!(err.to_string().contains("sheet.png"));
    }
}
