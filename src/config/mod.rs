//! Application Configuration
//!
//! Operator settings stored in TOML format: OCR backend options, the
//! preprocessing filter weights, and annotation output preferences.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// OCR backend settings
    pub ocr: OcrConfig,
    /// Preprocessing filter settings
    pub preprocess: PreprocessConfig,
    /// Annotated-output settings
    pub annotate: AnnotateConfig,
    /// Export settings
    pub output: OutputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            preprocess: PreprocessConfig::default(),
            annotate: AnnotateConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// OCR backend settings (Tesseract CLI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Executable name or full path
    pub command: String,
    /// Recognition language
    pub lang: String,
    /// Page segmentation mode
    pub psm: u8,
    /// Restrict recognition to decimal digits
    pub digits_only: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            lang: "eng".to_string(),
            psm: 6,
            digits_only: true,
        }
    }
}

/// Preprocessing filter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Gaussian blur sigma
    pub blur_sigma: f32,
    /// Weight of the grayscale image in the sharpen combine
    pub sharpen_weight: f32,
    /// Weight subtracted for the blurred image
    pub blur_weight: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 0.8,
            sharpen_weight: 1.5,
            blur_weight: 0.5,
        }
    }
}

/// Annotated-output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateConfig {
    /// Draw the annotated overlay at all
    pub enabled: bool,
    /// TTF/OTF font for labels; boxes only when unset
    pub font_path: Option<PathBuf>,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            font_path: None,
        }
    }
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory for the CSV export and annotated image; defaults to the
    /// current directory when unset
    pub dir: Option<PathBuf>,
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "rollcall", "rollcall-ocr")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
