//! Output records and CSV export
//!
//! One record per accepted roll number, stamped at record-creation time.
//! The export is a two-column CSV with a fixed header; transport of the
//! artifact (download, copy, archive) is outside this crate.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::format::{BatchYear, RollNumber};

/// CSV header row.
const CSV_HEADER: &str = "Timestamp,Roll Number";

/// Timestamp format used in record rows.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One exported roll number with its creation timestamp.
///
/// Records from one run share a semantic batch but each carries its own
/// stamp; two records created microseconds apart may differ and are
/// never deduplicated.
#[derive(Debug, Clone)]
pub struct OutputRecord {
    pub timestamp: DateTime<Local>,
    pub roll_number: RollNumber,
}

impl OutputRecord {
    /// Creates a record stamped with the current local time.
    pub fn now(roll_number: RollNumber) -> Self {
        Self {
            timestamp: Local::now(),
            roll_number,
        }
    }

    fn csv_row(&self) -> String {
        format!(
            "{},{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.roll_number
        )
    }
}

/// Default export filename: `roll_numbers_<batch>_<YYYYmmdd_HHMM>.csv`.
pub fn default_export_name(batch_year: &BatchYear) -> String {
    format!(
        "roll_numbers_{}_{}.csv",
        batch_year,
        Local::now().format("%Y%m%d_%H%M")
    )
}

/// Writes the records as a CSV file with a header row.
pub fn write_csv(path: &Path, records: &[OutputRecord]) -> Result<PathBuf> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    for record in records {
        writeln!(file, "{}", record.csv_row()).context("Failed to write CSV row")?;
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_roll_number;
    use tempfile::tempdir;

    fn record(token: &str) -> OutputRecord {
        let year = BatchYear::parse("2024").unwrap();
        OutputRecord::now(format_roll_number(token, &year).unwrap())
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_csv(&path, &[record("394"), record("120")]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Timestamp,Roll Number");
        assert!(lines[1].ends_with(",2024PECAI394"));
        assert!(lines[2].ends_with(",2024PECAI120"));
    }

    #[test]
    fn test_csv_row_timestamp_format() {
        let row = record("394").csv_row();
        let (stamp, number) = row.split_once(',').unwrap();
        assert_eq!(number, "2024PECAI394");
        // e.g. "2026-08-27 14:03:59"
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
    }

    #[test]
    fn test_duplicate_roll_numbers_are_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_csv(&path, &[record("394"), record("394")]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_default_export_name_embeds_batch_year() {
        let year = BatchYear::parse("2024").unwrap();
        let name = default_export_name(&year);
        assert!(name.starts_with("roll_numbers_2024_"));
        assert!(name.ends_with(".csv"));
    }
}
