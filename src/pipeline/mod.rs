//! Pipeline orchestration
//!
//! One `Run` is one complete execution: input validation, preprocessing,
//! a single OCR call, operator review, and assembly. The run owns all of
//! its state, including the cached OCR result, so front ends can
//! re-present the review step without ever re-invoking the detector.

pub mod assemble;

pub use assemble::{AssembledResult, ResultAssembler};

use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::format::BatchYear;
use crate::records::{self, OutputRecord};
use crate::review::{CorrectionPrompt, ReviewOutcome, ReviewSession};
use crate::vision::{Annotator, DetectionLine, Preprocessor, TextDetector};

/// Lifecycle of one run. `Rejected` is terminal and reachable only from
/// `AwaitingInput`; `Done` is terminal for a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    AwaitingInput,
    Preprocessing,
    Detecting,
    Reviewing,
    Assembling,
    Done,
    Rejected,
}

/// All state owned by one pipeline execution.
///
/// Artifact names embed the run id, so concurrent runs never clobber
/// each other's temporary or annotated images.
pub struct Run {
    id: Uuid,
    image: PathBuf,
    batch_year_input: String,
    batch_year: Option<BatchYear>,
    state: RunState,
    preprocessed: Option<PathBuf>,
    detections: Option<Vec<DetectionLine>>,
}

impl Run {
    pub fn new(image: impl Into<PathBuf>, batch_year: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            image: image.into(),
            batch_year_input: batch_year.into(),
            batch_year: None,
            state: RunState::Idle,
            preprocessed: None,
            detections: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The cached OCR result, present once detection has run.
    pub fn detections(&self) -> Option<&[DetectionLine]> {
        self.detections.as_deref()
    }
}

impl Drop for Run {
    /// Discards the run-scoped preprocessed temporary, whether the run
    /// completed or was abandoned mid-flight.
    fn drop(&mut self) {
        if let Some(path) = &self.preprocessed {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Final report of a completed run, for operator-facing messaging.
///
/// "Nothing detected" and "detected but none valid" are distinct states
/// with different remediation (retake the photo vs. correct tokens), so
/// the report keeps both counts.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub detection_count: usize,
    pub records: Vec<OutputRecord>,
    pub annotated_image: Option<PathBuf>,
    pub export: Option<PathBuf>,
}

impl RunReport {
    pub fn nothing_detected(&self) -> bool {
        self.detection_count == 0
    }

    pub fn none_valid(&self) -> bool {
        self.detection_count > 0 && self.records.is_empty()
    }
}

/// Drives a run through its states against the three collaborators.
///
/// Each step is strictly sequential; the review step may be re-entered
/// while awaiting operator input, everything else runs exactly once.
pub struct PipelineController<'a> {
    preprocessor: &'a dyn Preprocessor,
    detector: &'a mut dyn TextDetector,
    annotator: &'a dyn Annotator,
    /// Directory for run-scoped temporary images.
    work_dir: PathBuf,
}

impl<'a> PipelineController<'a> {
    pub fn new(
        preprocessor: &'a dyn Preprocessor,
        detector: &'a mut dyn TextDetector,
        annotator: &'a dyn Annotator,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            preprocessor,
            detector,
            annotator,
            work_dir: work_dir.into(),
        }
    }

    /// `AwaitingInput -> Preprocessing`, or `Rejected` on bad input.
    ///
    /// No collaborator is called for a rejected run.
    pub fn accept_input(&self, run: &mut Run) -> Result<(), PipelineError> {
        debug_assert_eq!(run.state, RunState::Idle);
        run.state = RunState::AwaitingInput;

        let batch_year = match BatchYear::parse(&run.batch_year_input) {
            Some(year) => year,
            None => {
                run.state = RunState::Rejected;
                return Err(PipelineError::InvalidBatchYear(run.batch_year_input.clone()));
            }
        };

        if !run.image.is_file() {
            run.state = RunState::Rejected;
            return Err(PipelineError::MissingImage(run.image.clone()));
        }

        run.batch_year = Some(batch_year);
        run.state = RunState::Preprocessing;
        Ok(())
    }

    /// `Preprocessing -> Detecting`: one preprocessing call, output named
    /// by run id.
    pub fn preprocess(&self, run: &mut Run) -> Result<(), PipelineError> {
        debug_assert_eq!(run.state, RunState::Preprocessing);

        let output = self.work_dir.join(format!("preprocessed-{}.png", run.id));
        let path = self
            .preprocessor
            .preprocess(&run.image, &output)
            .map_err(PipelineError::Preprocess)?;

        run.preprocessed = Some(path);
        run.state = RunState::Detecting;
        Ok(())
    }

    /// `Detecting -> Reviewing`: invokes OCR exactly once; the result is
    /// cached in the run for every later presentation.
    pub fn detect(&mut self, run: &mut Run) -> Result<(), PipelineError> {
        debug_assert_eq!(run.state, RunState::Detecting);

        // Invariant: one OCR invocation per run.
        if run.detections.is_none() {
            let image = run
                .preprocessed
                .as_deref()
                .unwrap_or(run.image.as_path());
            let lines = self
                .detector
                .detect(image)
                .map_err(PipelineError::Detection)?;
            info!("OCR returned {} detection lines", lines.len());
            run.detections = Some(lines);
        }

        run.state = RunState::Reviewing;
        Ok(())
    }

    /// Runs one review pass over the cached detections.
    ///
    /// Callable repeatedly while the run is in `Reviewing`; never touches
    /// the detector.
    pub fn review(&self, run: &Run, prompt: &mut dyn CorrectionPrompt) -> ReviewOutcome {
        debug_assert_eq!(run.state, RunState::Reviewing);

        let batch_year = run.batch_year.as_ref().expect("validated before review");
        let lines = run.detections.as_deref().unwrap_or(&[]);
        ReviewSession::new(batch_year).review(lines, prompt)
    }

    /// `Assembling -> Done`: renders the annotated image (best effort),
    /// materializes records, and writes the CSV export when any records
    /// exist. Records already written are never retracted.
    pub fn assemble(
        &self,
        run: &mut Run,
        outcome: &ReviewOutcome,
        output_dir: &Path,
    ) -> Result<RunReport, PipelineError> {
        debug_assert_eq!(run.state, RunState::Reviewing);
        run.state = RunState::Assembling;

        let batch_year = run.batch_year.as_ref().expect("validated before assembly");
        let annotated_path = output_dir.join(format!("annotated-{}.png", run.id));
        let source_image = run.preprocessed.as_deref().unwrap_or(run.image.as_path());

        let assembled =
            ResultAssembler::new(self.annotator).assemble(source_image, outcome, &annotated_path);

        let export = if assembled.records.is_empty() {
            None
        } else {
            let csv_path = output_dir.join(records::default_export_name(batch_year));
            let path = records::write_csv(&csv_path, &assembled.records)
                .map_err(PipelineError::Export)?;
            info!("Exported {} records to {}", assembled.records.len(), path.display());
            Some(path)
        };

        run.state = RunState::Done;

        Ok(RunReport {
            run_id: run.id,
            detection_count: run
                .detections
                .as_ref()
                .map(|lines| lines.iter().map(|l| l.detections.len()).sum())
                .unwrap_or(0),
            records: assembled.records,
            annotated_image: assembled.annotated_image,
            export,
        })
    }

    /// Drives a run end to end. Batch front ends call this; interactive
    /// ones call the individual steps so review can span interactions.
    pub fn execute(
        &mut self,
        run: &mut Run,
        prompt: &mut dyn CorrectionPrompt,
        output_dir: &Path,
    ) -> Result<RunReport, PipelineError> {
        self.accept_input(run)?;
        self.preprocess(run)?;
        self.detect(run)?;
        let outcome = self.review(run, prompt);
        self.assemble(run, &outcome, output_dir)
    }
}
