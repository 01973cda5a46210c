//! rollcall-ocr - Student roll number extraction from roll-call sheets
//!
//! Photographed sheet in, timestamped CSV of roll numbers out: the image
//! is preprocessed, OCR'd once, each detected token gets one operator
//! correction opportunity, and accepted 3-digit tokens become
//! `<batch year>PECAI<token>` records.

mod config;
mod error;
mod format;
mod pipeline;
mod records;
mod review;
mod vision;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;
use crate::pipeline::{PipelineController, Run, RunReport};
use crate::review::{CorrectionPrompt, PresetCorrections, StdinPrompt};
use crate::vision::{Annotator, BoxAnnotator, NullAnnotator, SharpenFilter, TesseractDetector};

/// Extract student roll numbers from a photographed roll-call sheet
#[derive(Parser, Debug)]
#[command(name = "rollcall-ocr")]
#[command(about = "OCR roll number extraction with operator review")]
struct Args {
    /// Path to the roll-call sheet image
    image: PathBuf,

    /// 4-digit batch year, e.g. 2024
    batch_year: String,

    /// Directory for the CSV export and annotated image
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Pre-supplied correction as INDEX=VALUE (repeatable); implies
    /// non-interactive review
    #[arg(long = "correct", value_name = "IDX=VAL")]
    corrections: Vec<String>,

    /// Review without prompting; keep every detected token as-is
    #[arg(long)]
    batch: bool,

    /// Skip the annotated output image
    #[arg(long)]
    no_annotate: bool,

    /// Font file for annotation labels (overrides config)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Configuration file (defaults to the per-user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to initialize logging");
    }

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = load_or_create_config(args.config.as_deref());

    let preprocessor = SharpenFilter {
        blur_sigma: config.preprocess.blur_sigma,
        sharpen_weight: config.preprocess.sharpen_weight,
        blur_weight: config.preprocess.blur_weight,
    };

    let mut detector = TesseractDetector {
        command: config.ocr.command.clone(),
        lang: config.ocr.lang.clone(),
        psm: config.ocr.psm,
        digits_only: config.ocr.digits_only,
    };

    let annotator = build_annotator(&args, &config)?;

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.output.dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir)?;

    let mut prompt = build_prompt(&args)?;

    let mut run = Run::new(&args.image, args.batch_year.clone());
    let mut controller = PipelineController::new(
        &preprocessor,
        &mut detector,
        annotator.as_ref(),
        std::env::temp_dir(),
    );

    match controller.execute(&mut run, prompt.as_mut(), &output_dir) {
        Ok(report) => {
            print_report(&report);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_rejection() => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

/// Load configuration from the given path, the per-user config dir, or
/// fall back to defaults.
fn load_or_create_config(path: Option<&std::path::Path>) -> AppConfig {
    if let Some(path) = path {
        match config::load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                return config;
            }
            Err(e) => warn!("Could not load {}: {:#}", path.display(), e),
        }
    } else if let Ok(config_dir) = config::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            if let Ok(config) = config::load_config(&config_path) {
                info!("Loaded configuration from {}", config_path.display());
                return config;
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

fn build_annotator(args: &Args, config: &AppConfig) -> Result<Box<dyn Annotator>> {
    if args.no_annotate || !config.annotate.enabled {
        return Ok(Box::new(NullAnnotator));
    }
    let font_path = args.font.as_ref().or(config.annotate.font_path.as_ref());
    match font_path {
        Some(path) => Ok(Box::new(BoxAnnotator::with_font_path(path)?)),
        None => Ok(Box::new(BoxAnnotator::new())),
    }
}

fn build_prompt(args: &Args) -> Result<Box<dyn CorrectionPrompt>> {
    if !args.corrections.is_empty() {
        Ok(Box::new(PresetCorrections::from_pairs(&args.corrections)?))
    } else if args.batch {
        Ok(Box::new(review::NoCorrections))
    } else {
        Ok(Box::new(StdinPrompt))
    }
}

fn print_report(report: &RunReport) {
    info!("Run {} finished", report.run_id);

    if report.nothing_detected() {
        println!("No text detected on the sheet. Retake the photo and try again.");
        return;
    }

    if report.none_valid() {
        println!(
            "Detected {} tokens but none were valid 3-digit roll numbers.",
            report.detection_count
        );
    } else {
        println!("Final Roll Numbers:");
        for record in &report.records {
            println!("- {}", record.roll_number);
        }
    }

    match &report.annotated_image {
        Some(path) => println!("Annotated image: {}", path.display()),
        None => println!("Could not visualize OCR results."),
    }

    if let Some(path) = &report.export {
        println!("Roll numbers saved to: {}", path.display());
    }
}
