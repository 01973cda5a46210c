//! Detection review pass
//!
//! Walks every OCR detection once, offers the operator a single
//! correction opportunity through the [`CorrectionPrompt`] seam, and
//! collects the accepted roll numbers. The pass itself does no I/O, so
//! any front end that can implement the prompt gets identical semantics.

pub mod prompt;

pub use prompt::{CorrectionPrompt, NoCorrections, PresetCorrections, StdinPrompt};

use tracing::debug;

use crate::format::{format_roll_number, is_valid_token, BatchYear, RollNumber};
use crate::vision::{Detection, DetectionLine};

/// Where a reviewed detection's accepted text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Original,
    Corrected,
}

/// A detection after its correction opportunity.
///
/// The original detection is kept untouched; `accepted_text` is the
/// operator's final value (defaulting to the detected text).
#[derive(Debug, Clone)]
pub struct ReviewedDetection {
    pub detection: Detection,
    pub accepted_text: String,
    pub source: TextSource,
}

/// Output of one review pass.
#[derive(Debug, Clone, Default)]
pub struct ReviewOutcome {
    /// Corrected copies of every detection, in processing order.
    pub reviewed: Vec<ReviewedDetection>,
    /// Roll numbers for the accepted tokens, in processing order.
    /// Always at most one per detection.
    pub roll_numbers: Vec<RollNumber>,
}

/// One correction pass over one OCR result.
pub struct ReviewSession<'a> {
    batch_year: &'a BatchYear,
}

impl<'a> ReviewSession<'a> {
    pub fn new(batch_year: &'a BatchYear) -> Self {
        Self { batch_year }
    }

    /// Reviews every detection, line order then within-line order.
    ///
    /// A correction is adopted only when it is exactly 3 decimal digits;
    /// anything else keeps the original text. That holds even when the
    /// original was itself valid, so an operator cannot replace a valid
    /// token with a shorter or non-numeric one.
    pub fn review(
        &self,
        lines: &[DetectionLine],
        prompt: &mut dyn CorrectionPrompt,
    ) -> ReviewOutcome {
        let mut outcome = ReviewOutcome::default();

        for line in lines {
            for detection in &line.detections {
                let (accepted_text, source) = match prompt.correct(detection) {
                    Some(correction) if is_valid_token(&correction) => {
                        debug!("Correction accepted: '{}' -> '{}'", detection.text, correction);
                        (correction, TextSource::Corrected)
                    }
                    Some(rejected) => {
                        debug!(
                            "Correction '{}' rejected, keeping '{}'",
                            rejected, detection.text
                        );
                        (detection.text.clone(), TextSource::Original)
                    }
                    None => (detection.text.clone(), TextSource::Original),
                };

                if let Some(roll_number) = format_roll_number(&accepted_text, self.batch_year) {
                    outcome.roll_numbers.push(roll_number);
                }

                outcome.reviewed.push(ReviewedDetection {
                    detection: detection.clone(),
                    accepted_text,
                    source,
                });
            }
        }

        debug!(
            "Review complete: {} detections, {} roll numbers",
            outcome.reviewed.len(),
            outcome.roll_numbers.len()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::ocr::detection;

    /// Scripted prompt answering from a fixed queue, one entry per call.
    struct QueuedPrompt {
        answers: Vec<Option<String>>,
        next: usize,
    }

    impl QueuedPrompt {
        fn new(answers: Vec<Option<&str>>) -> Self {
            Self {
                answers: answers
                    .into_iter()
                    .map(|a| a.map(str::to_string))
                    .collect(),
                next: 0,
            }
        }
    }

    impl CorrectionPrompt for QueuedPrompt {
        fn correct(&mut self, _detection: &Detection) -> Option<String> {
            let answer = self.answers.get(self.next).cloned().flatten();
            self.next += 1;
            answer
        }
    }

    fn year() -> BatchYear {
        BatchYear::parse("2024").unwrap()
    }

    fn sheet(tokens: &[(&str, f32)]) -> Vec<DetectionLine> {
        vec![DetectionLine::new(
            tokens.iter().map(|(t, c)| detection(t, *c)).collect(),
        )]
    }

    #[test]
    fn test_no_corrections_keeps_originals() {
        let lines = sheet(&[("394", 0.98), ("12E", 0.40)]);
        let y = year();
        let outcome = ReviewSession::new(&y).review(&lines, &mut NoCorrections);

        assert_eq!(outcome.reviewed.len(), 2);
        assert_eq!(outcome.reviewed[0].accepted_text, "394");
        assert_eq!(outcome.reviewed[0].source, TextSource::Original);
        assert_eq!(outcome.reviewed[1].accepted_text, "12E");

        let numbers: Vec<&str> = outcome.roll_numbers.iter().map(|r| r.as_str()).collect();
        assert_eq!(numbers, ["2024PECAI394"]);
    }

    #[test]
    fn test_valid_correction_is_adopted() {
        let lines = sheet(&[("394", 0.98), ("12E", 0.40)]);
        let y = year();
        let mut prompt = QueuedPrompt::new(vec![None, Some("120")]);
        let outcome = ReviewSession::new(&y).review(&lines, &mut prompt);

        assert_eq!(outcome.reviewed[1].accepted_text, "120");
        assert_eq!(outcome.reviewed[1].source, TextSource::Corrected);
        // Original detection text is preserved for audit
        assert_eq!(outcome.reviewed[1].detection.text, "12E");

        let numbers: Vec<&str> = outcome.roll_numbers.iter().map(|r| r.as_str()).collect();
        assert_eq!(numbers, ["2024PECAI394", "2024PECAI120"]);
    }

    #[test]
    fn test_invalid_corrections_are_discarded() {
        let lines = sheet(&[("12E", 0.4), ("34F", 0.4), ("56G", 0.4), ("78H", 0.4)]);
        let y = year();
        let mut prompt = QueuedPrompt::new(vec![
            Some(""),     // empty
            Some("12"),   // too short
            Some("1234"), // too long
            Some("abc"),  // non-numeric
        ]);
        let outcome = ReviewSession::new(&y).review(&lines, &mut prompt);

        for reviewed in &outcome.reviewed {
            assert_eq!(reviewed.accepted_text, reviewed.detection.text);
            assert_eq!(reviewed.source, TextSource::Original);
        }
        assert!(outcome.roll_numbers.is_empty());
    }

    #[test]
    fn test_valid_original_cannot_be_downgraded() {
        // Replacing "394" with "39" must be discarded; the original stands.
        let lines = sheet(&[("394", 0.98)]);
        let y = year();
        let mut prompt = QueuedPrompt::new(vec![Some("39")]);
        let outcome = ReviewSession::new(&y).review(&lines, &mut prompt);

        assert_eq!(outcome.reviewed[0].accepted_text, "394");
        assert_eq!(outcome.roll_numbers.len(), 1);
    }

    #[test]
    fn test_order_follows_detection_order_across_lines() {
        let lines = vec![
            DetectionLine::new(vec![detection("300", 0.9), detection("100", 0.9)]),
            DetectionLine::new(vec![detection("200", 0.9)]),
        ];
        let y = year();
        let outcome = ReviewSession::new(&y).review(&lines, &mut NoCorrections);

        let numbers: Vec<&str> = outcome.roll_numbers.iter().map(|r| r.as_str()).collect();
        // Emission order, never spatially or numerically sorted
        assert_eq!(numbers, ["2024PECAI300", "2024PECAI100", "2024PECAI200"]);
    }

    #[test]
    fn test_roll_numbers_never_exceed_detection_count() {
        let lines = sheet(&[("001", 0.9), ("xx", 0.2), ("002", 0.9)]);
        let y = year();
        let outcome = ReviewSession::new(&y).review(&lines, &mut NoCorrections);
        assert!(outcome.roll_numbers.len() <= outcome.reviewed.len());
        assert_eq!(outcome.roll_numbers.len(), 2);
    }

    #[test]
    fn test_empty_input_yields_empty_outcome() {
        let y = year();
        let outcome = ReviewSession::new(&y).review(&[], &mut NoCorrections);
        assert!(outcome.reviewed.is_empty());
        assert!(outcome.roll_numbers.is_empty());
    }
}
