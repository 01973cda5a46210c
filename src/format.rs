//! Roll number formatting
//!
//! Converts an accepted 3-digit OCR token and a batch year into the
//! canonical roll number string, e.g. batch year `2024` + token `394`
//! → `2024PECAI394`.

use std::fmt;

/// Department code embedded in every roll number.
const DEPARTMENT_CODE: &str = "PECAI";

/// A validated 4-digit batch year (e.g. "2024").
///
/// Validation happens once, at the pipeline boundary. Everything past
/// that boundary trusts a constructed `BatchYear`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchYear(String);

impl BatchYear {
    /// Parses a batch year, requiring exactly 4 ASCII decimal digits.
    pub fn parse(input: &str) -> Option<BatchYear> {
        if input.len() == 4 && input.chars().all(|c| c.is_ascii_digit()) {
            Some(BatchYear(input.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A canonical roll number: `<batch year>PECAI<3-digit token>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollNumber(String);

impl RollNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RollNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns true if the token is exactly 3 ASCII decimal digits.
pub fn is_valid_token(token: &str) -> bool {
    token.len() == 3 && token.chars().all(|c| c.is_ascii_digit())
}

/// Formats a roll number from an OCR token and the batch year.
///
/// Returns `None` unless the token is exactly 3 decimal digits. Pure and
/// total; never fails for any input string.
pub fn format_roll_number(token: &str, batch_year: &BatchYear) -> Option<RollNumber> {
    if is_valid_token(token) {
        Some(RollNumber(format!("{}{}{}", batch_year, DEPARTMENT_CODE, token)))
    } else {
        None
    }
}
