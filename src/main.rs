use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pantry_receipts::config::AppConfig;
use pantry_receipts::errors::error_logging;
use pantry_receipts::health::HealthScorer;
use pantry_receipts::observability;
use pantry_receipts::preprocessing::{preprocess, RawImage};
use pantry_receipts::{Catalog, ReceiptParser, ReceiptValidator};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "pantry-receipts")]
#[command(about = "Turn grocery receipt photos into structured, validated inventory records")]
struct Cli {
    /// Print Prometheus metrics to stderr when done
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Preprocess, recognize, parse and validate a receipt photo
    Scan {
        image: PathBuf,
        /// Store name, overrides detection
        #[arg(long)]
        vendor: Option<String>,
    },
    /// Parse an OCR transcript (`-` reads stdin)
    Parse {
        transcript: String,
        #[arg(long)]
        vendor: Option<String>,
        /// Date used for expiry estimates when the receipt has none (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<NaiveDate>,
        /// Include a basket health summary
        #[arg(long)]
        health: bool,
    },
    /// Check an OCR transcript for quality problems (`-` reads stdin)
    Validate { transcript: String },
    /// Run only the image preprocessing and write the result as PNG
    Preprocess {
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreprocessSummary {
    output: String,
    width: u32,
    height: u32,
    adjustments: Vec<&'static str>,
    threshold: u8,
    processing_time_ms: u32,
}

fn read_transcript(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read transcript from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(source).with_context(|| format!("Failed to read transcript '{}'", source))
}

fn read_image(path: &Path) -> Result<RawImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image '{}'", path.display()))?;
    Ok(RawImage::encoded(bytes))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(feature = "tesseract")]
async fn scan(config: AppConfig, catalog: Arc<Catalog>, image: &Path, vendor: Option<&str>) -> Result<()> {
    use pantry_receipts::ocr::TesseractEngine;
    use pantry_receipts::pipeline::ReceiptScanner;

    let engine = Arc::new(TesseractEngine::new(&config.ocr));
    let scanner = ReceiptScanner::new(config, catalog, engine);
    let report = scanner.scan(read_image(image)?, vendor).await?;
    print_json(&report)
}

#[cfg(not(feature = "tesseract"))]
async fn scan(_config: AppConfig, _catalog: Arc<Catalog>, _image: &Path, _vendor: Option<&str>) -> Result<()> {
    bail!("OCR is unavailable in this build; rebuild with `--features tesseract`")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "environment", "startup validation");
        bail!("{}", e);
    }

    observability::init_tracing(&config.observability)?;
    let metrics_handle = if cli.print_metrics {
        Some(observability::init_metrics()?)
    } else {
        None
    };
    info!("{}", config.summary());

    let catalog = Arc::new(Catalog::load(config.catalog_path.as_deref()));

    match cli.command {
        Command::Scan { image, vendor } => {
            scan(config, catalog, &image, vendor.as_deref()).await?;
        }
        Command::Parse {
            transcript,
            vendor,
            reference_date,
            health,
        } => {
            let text = read_transcript(&transcript)?;
            let parser = ReceiptParser::new(Arc::clone(&catalog), config.parser.clone());
            let receipt = match reference_date {
                Some(today) => parser.parse_with_reference(&text, vendor.as_deref(), today),
                None => parser.parse(&text, vendor.as_deref()),
            };
            if health {
                let summary = HealthScorer::from_catalog(catalog, &config.health).score(&receipt.items);
                print_json(&serde_json::json!({ "receipt": receipt, "health": summary }))?;
            } else {
                print_json(&receipt)?;
            }
        }
        Command::Validate { transcript } => {
            let text = read_transcript(&transcript)?;
            let validator = ReceiptValidator::new(catalog, config.validation.clone());
            print_json(&validator.validate(&text))?;
        }
        Command::Preprocess { image, output } => {
            let raw = read_image(&image)?;
            let preprocessed = preprocess(&raw, &config.preprocessing)?;
            let png = preprocessed.to_png().context("Failed to encode PNG")?;
            std::fs::write(&output, png)
                .with_context(|| format!("Failed to write '{}'", output.display()))?;
            print_json(&PreprocessSummary {
                output: output.display().to_string(),
                width: preprocessed.width(),
                height: preprocessed.height(),
                adjustments: preprocessed.adjustment_labels(),
                threshold: preprocessed.threshold(),
                processing_time_ms: preprocessed.processing_time_ms(),
            })?;
        }
    }

    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }
    Ok(())
}
