//! Tesseract CLI detector backend
//!
//! Runs the `tesseract` executable on the preprocessed sheet and parses
//! its TSV output into detection lines. Word boxes come from the TSV
//! left/top/width/height columns; confidences are rescaled from
//! Tesseract's 0-100 range to [0, 1].

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;
use uuid::Uuid;

use super::ocr::{Detection, DetectionLine, TextDetector};

/// OCR backend driving the Tesseract command line tool.
pub struct TesseractDetector {
    /// Executable name or path (default `tesseract`).
    pub command: String,
    /// Recognition language (default `eng`).
    pub lang: String,
    /// Page segmentation mode; 6 assumes a uniform block of text, which
    /// suits a roll-call sheet of stacked numbers.
    pub psm: u8,
    /// Restrict recognition to digits.
    pub digits_only: bool,
}

impl Default for TesseractDetector {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            lang: "eng".to_string(),
            psm: 6,
            digits_only: true,
        }
    }
}

impl TextDetector for TesseractDetector {
    fn detect(&mut self, image: &Path) -> Result<Vec<DetectionLine>> {
        let output_base = std::env::temp_dir().join(format!("rollcall-ocr-{}", Uuid::new_v4()));

        let mut cmd = Command::new(&self.command);
        cmd.arg(image)
            .arg(&output_base)
            .arg("-l")
            .arg(&self.lang)
            .arg("--psm")
            .arg(self.psm.to_string());
        if self.digits_only {
            cmd.arg("-c").arg("tessedit_char_whitelist=0123456789");
        }
        cmd.arg("tsv");

        let output = cmd
            .output()
            .with_context(|| format!("Failed to launch '{}'", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let tsv_path = output_base.with_extension("tsv");
        let tsv = std::fs::read_to_string(&tsv_path)
            .with_context(|| format!("Failed to read Tesseract output {}", tsv_path.display()))?;
        let _ = std::fs::remove_file(&tsv_path);

        let lines = parse_tsv(&tsv)?;
        debug!(
            "Tesseract found {} lines in {}",
            lines.len(),
            image.display()
        );
        Ok(lines)
    }
}

/// Parses Tesseract TSV output into detection lines.
///
/// TSV columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Level 5 rows are words; line
/// grouping follows the (block, par, line) triple in emission order.
fn parse_tsv(tsv: &str) -> Result<Vec<DetectionLine>> {
    let mut lines: Vec<DetectionLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current: Vec<Detection> = Vec::new();

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields[11].trim();
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let block: i32 = fields[2].parse().unwrap_or(-1);
        let par: i32 = fields[3].parse().unwrap_or(-1);
        let line: i32 = fields[4].parse().unwrap_or(-1);
        let left: f32 = fields[6].parse().unwrap_or(0.0);
        let top: f32 = fields[7].parse().unwrap_or(0.0);
        let width: f32 = fields[8].parse().unwrap_or(0.0);
        let height: f32 = fields[9].parse().unwrap_or(0.0);

        let key = (block, par, line);
        if current_key.is_some() && current_key != Some(key) && !current.is_empty() {
            lines.push(DetectionLine::new(std::mem::take(&mut current)));
        }
        current_key = Some(key);

        current.push(Detection::new(
            [
                (left, top),
                (left + width, top),
                (left + width, top + height),
                (left, top + height),
            ],
            text,
            (conf / 100.0).clamp(0.0, 1.0),
        ));
    }

    if !current.is_empty() {
        lines.push(DetectionLine::new(current));
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word_row(block: i32, line: i32, word: i32, left: i32, conf: f32, text: &str) -> String {
        format!(
            "5\t1\t{}\t1\t{}\t{}\t{}\t40\t60\t20\t{}\t{}",
            block, line, word, left, conf, text
        )
    }

    #[test]
    fn test_parse_tsv_groups_words_by_line() {
        let tsv = [
            HEADER.to_string(),
            "4\t1\t1\t1\t1\t0\t0\t0\t200\t30\t-1\t".to_string(),
            word_row(1, 1, 1, 10, 96.5, "394"),
            word_row(1, 1, 2, 80, 40.2, "12E"),
            word_row(1, 2, 1, 10, 88.0, "120"),
        ]
        .join("\n");

        let lines = parse_tsv(&tsv).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].detections.len(), 2);
        assert_eq!(lines[0].detections[0].text, "394");
        assert_eq!(lines[1].detections[0].text, "120");
    }

    #[test]
    fn test_parse_tsv_rescales_confidence() {
        let tsv = [HEADER.to_string(), word_row(1, 1, 1, 10, 96.5, "394")].join("\n");
        let lines = parse_tsv(&tsv).unwrap();
        let conf = lines[0].detections[0].confidence;
        assert!((conf - 0.965).abs() < 1e-4);
    }

    #[test]
    fn test_parse_tsv_box_corners() {
        let tsv = [HEADER.to_string(), word_row(1, 1, 1, 10, 90.0, "394")].join("\n");
        let lines = parse_tsv(&tsv).unwrap();
        let polygon = lines[0].detections[0].polygon;
        assert_eq!(polygon[0], (10.0, 40.0));
        assert_eq!(polygon[1], (70.0, 40.0));
        assert_eq!(polygon[2], (70.0, 60.0));
        assert_eq!(polygon[3], (10.0, 60.0));
    }

    #[test]
    fn test_parse_tsv_skips_non_words_and_empty() {
        let tsv = [
            HEADER.to_string(),
            "5\t1\t1\t1\t1\t1\t10\t40\t60\t20\t-1\t394".to_string(), // conf < 0
            "5\t1\t1\t1\t1\t2\t10\t40\t60\t20\t90\t ".to_string(),   // empty text
        ]
        .join("\n");

        let lines = parse_tsv(&tsv).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_parse_tsv_empty_input() {
        assert!(parse_tsv(HEADER).unwrap().is_empty());
        assert!(parse_tsv("").unwrap().is_empty());
    }
}
