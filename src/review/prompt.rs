//! Correction prompt implementations
//!
//! The prompt is the seam between the review pass and whatever front end
//! is driving it. Both front ends funnel through the same trait so the
//! acceptance rule lives in one place.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use tracing::warn;

use crate::format::is_valid_token;
use crate::vision::Detection;

/// The operator-correction collaborator: one call per detection.
///
/// `None` means "keep the original text". Implementations must swallow
/// their own I/O failures and answer `None`; a failed prompt never aborts
/// a review pass.
pub trait CorrectionPrompt {
    fn correct(&mut self, detection: &Detection) -> Option<String>;
}

/// Interactive terminal prompt.
///
/// Prints the detected token and confidence, and only asks for a
/// replacement when the token is not already a valid 3-digit number;
/// valid tokens pass through unprompted.
pub struct StdinPrompt;

impl CorrectionPrompt for StdinPrompt {
    fn correct(&mut self, detection: &Detection) -> Option<String> {
        println!(
            "Detected: {} | Confidence: {:.4}",
            detection.text, detection.confidence
        );

        if is_valid_token(&detection.text) {
            return None;
        }

        print!(
            "Edit misread value '{}' to correct 3-digit number (or press Enter to skip): ",
            detection.text
        );
        if io::stdout().flush().is_err() {
            return None;
        }

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(_) => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(e) => {
                warn!("Correction input unavailable, keeping original: {}", e);
                None
            }
        }
    }
}

/// Corrections supplied up front, keyed by detection index.
///
/// Backs the batch front end (`--correct IDX=VAL` on the command line)
/// and scripted tests. Offers the edit for every detection, like the
/// original interactive front end's always-present edit field.
pub struct PresetCorrections {
    corrections: HashMap<usize, String>,
    next_index: usize,
}

impl PresetCorrections {
    pub fn new(corrections: HashMap<usize, String>) -> Self {
        Self {
            corrections,
            next_index: 0,
        }
    }

    /// Parses repeatable `IDX=VALUE` command line pairs.
    pub fn from_pairs(pairs: &[String]) -> anyhow::Result<Self> {
        let mut corrections = HashMap::new();
        for pair in pairs {
            let (idx, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Invalid correction '{}', expected IDX=VALUE", pair))?;
            let idx: usize = idx
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid correction index in '{}'", pair))?;
            corrections.insert(idx, value.trim().to_string());
        }
        Ok(Self::new(corrections))
    }
}

impl CorrectionPrompt for PresetCorrections {
    fn correct(&mut self, _detection: &Detection) -> Option<String> {
        let index = self.next_index;
        self.next_index += 1;
        self.corrections.get(&index).cloned()
    }
}

/// Prompt that never offers a correction.
pub struct NoCorrections;

impl CorrectionPrompt for NoCorrections {
    fn correct(&mut self, _detection: &Detection) -> Option<String> {
        None
    }
}
