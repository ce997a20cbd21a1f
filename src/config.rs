//! # Unified Application Configuration
//!
//! This module consolidates every pipeline setting into a single, structured
//! configuration object. It supports loading from environment variables,
//! validation, and a redacted summary for startup logging.

use crate::errors::{AppError, AppResult};
use crate::model::Category;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Image preprocessing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Images whose width or height exceeds this are downscaled (long side)
    pub max_dimension: u32,
    /// Gain applied around the 128 midpoint during the contrast stretch
    pub contrast_gain: f32,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2000,
            contrast_gain: 1.3,
        }
    }
}

impl PreprocessingConfig {
    /// Validate preprocessing configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.max_dimension < 100 {
            return Err(AppError::Config(format!(
                "max_dimension {} is too small (minimum 100 pixels)",
                self.max_dimension
            )));
        }
        if !(0.1..=5.0).contains(&self.contrast_gain) {
            return Err(AppError::Config(format!(
                "contrast_gain {} must be between 0.1 and 5.0",
                self.contrast_gain
            )));
        }
        Ok(())
    }
}

/// Receipt text parser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Single output currency (ISO 4217)
    pub currency: String,
    /// Category used when no keyword matches an item name
    pub default_category: Category,
    /// Relative reconciliation tolerance against the stated total
    pub reconciliation_tolerance: f64,
    /// Absolute floor of the reconciliation band, in currency units
    pub min_reconciliation_tolerance: f64,
    /// Relative tolerance between quantity x unit price and the line total
    pub quantity_tolerance: f64,
    /// Item names shorter than this are discarded as false positives
    pub min_item_name_len: usize,
    /// Items below this confidence are flagged for review
    pub item_review_threshold: f32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            currency: "CAD".to_string(),
            default_category: Category::Pantry,
            reconciliation_tolerance: 0.01,
            min_reconciliation_tolerance: 0.02,
            quantity_tolerance: 0.01,
            min_item_name_len: 2,
            item_review_threshold: 0.6,
        }
    }
}

impl ParserConfig {
    /// Validate parser configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AppError::Config(format!(
                "currency '{}' must be a three-letter ISO code",
                self.currency
            )));
        }
        if !(0.0..=0.5).contains(&self.reconciliation_tolerance) {
            return Err(AppError::Config(
                "reconciliation_tolerance must be between 0.0 and 0.5".to_string(),
            ));
        }
        if self.min_reconciliation_tolerance < 0.0 {
            return Err(AppError::Config(
                "min_reconciliation_tolerance cannot be negative".to_string(),
            ));
        }
        if !(0.0..=0.5).contains(&self.quantity_tolerance) {
            return Err(AppError::Config(
                "quantity_tolerance must be between 0.0 and 0.5".to_string(),
            ));
        }
        if self.min_item_name_len == 0 {
            return Err(AppError::Config(
                "min_item_name_len must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.item_review_threshold) {
            return Err(AppError::Config(
                "item_review_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Transcript validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Trimmed transcripts shorter than this are low quality
    pub min_transcript_chars: usize,
    /// Fewer money tokens than this means no prices were read
    pub min_price_tokens: usize,
    /// More "total" keywords than this hints at several receipts
    pub max_total_keywords: usize,
    /// French must beat English and exceed this many keyword hits
    pub french_keyword_floor: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_transcript_chars: 20,
            min_price_tokens: 2,
            max_total_keywords: 2,
            french_keyword_floor: 2,
        }
    }
}

impl ValidationConfig {
    /// Validate validation configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.min_transcript_chars == 0 {
            return Err(AppError::Config(
                "min_transcript_chars must be greater than 0".to_string(),
            ));
        }
        if self.min_price_tokens == 0 {
            return Err(AppError::Config(
                "min_price_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Health scoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Category assumed for unrecognized names when scoring a basket
    pub default_category: Category,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            default_category: Category::Other,
        }
    }
}

/// OCR collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language string
    pub languages: String,
    /// Optional tessdata directory override
    pub tessdata_dir: Option<String>,
    /// Timeout for one OCR call in seconds
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: "eng+fra".to_string(),
            tessdata_dir: None,
            timeout_secs: 30,
        }
    }
}

impl OcrConfig {
    /// Validate OCR configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(AppError::Config("OCR languages cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config("OCR timeout cannot be 0".to_string()));
        }
        if self.timeout_secs > 300 {
            return Err(AppError::Config(
                "OCR timeout cannot be greater than 300 seconds".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// Log level for the crate's own targets
    pub log_level: String,
    /// `pretty` or `json`
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Validate logging configuration
    pub fn validate(&self) -> AppResult<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.as_str()) {
            return Err(AppError::Config(format!(
                "Invalid log level '{}'. Expected one of {:?}",
                self.log_level, LEVELS
            )));
        }
        if self.log_format != "pretty" && self.log_format != "json" {
            return Err(AppError::Config(format!(
                "Invalid log format '{}'. Expected 'pretty' or 'json'",
                self.log_format
            )));
        }
        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub preprocessing: PreprocessingConfig,
    pub parser: ParserConfig,
    pub validation: ValidationConfig,
    pub health: HealthConfig,
    pub ocr: OcrConfig,
    pub observability: ObservabilityConfig,
    /// Optional JSON catalog overriding the built-in tables
    pub catalog_path: Option<String>,
}

/// Reads `key`, falling back to `default` when unset, and parses it.
fn env_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        config.preprocessing.max_dimension =
            env_or("RECEIPT_MAX_DIMENSION", config.preprocessing.max_dimension)?;
        config.preprocessing.contrast_gain =
            env_or("RECEIPT_CONTRAST_GAIN", config.preprocessing.contrast_gain)?;

        config.parser.currency = env_or("RECEIPT_CURRENCY", config.parser.currency)?;
        config.parser.default_category =
            env_or("RECEIPT_DEFAULT_CATEGORY", config.parser.default_category)?;
        config.parser.reconciliation_tolerance = env_or(
            "RECONCILIATION_TOLERANCE",
            config.parser.reconciliation_tolerance,
        )?;
        config.parser.min_reconciliation_tolerance = env_or(
            "RECONCILIATION_MIN_TOLERANCE",
            config.parser.min_reconciliation_tolerance,
        )?;

        config.health.default_category =
            env_or("HEALTH_DEFAULT_CATEGORY", config.health.default_category)?;

        config.ocr.languages = env_or("OCR_LANGUAGES", config.ocr.languages)?;
        config.ocr.tessdata_dir = env::var("TESSDATA_DIR").ok();
        config.ocr.timeout_secs = env_or("OCR_TIMEOUT_SECS", config.ocr.timeout_secs)?;

        config.observability.environment =
            env_or("ENVIRONMENT", config.observability.environment)?;
        config.observability.log_level = env_or("LOG_LEVEL", config.observability.log_level)?;
        config.observability.log_format = env_or("LOG_FORMAT", config.observability.log_format)?;

        config.catalog_path = env::var("RECEIPT_CATALOG_PATH").ok();

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.preprocessing.validate()?;
        self.parser.validate()?;
        self.validation.validate()?;
        self.ocr.validate()?;
        self.observability.validate()?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: max_dimension={}, currency={}, parser_default={}, health_default={}, ocr_languages={}, tessdata_dir={}, catalog={}",
            self.preprocessing.max_dimension,
            self.parser.currency,
            self.parser.default_category,
            self.health.default_category,
            self.ocr.languages,
            if self.ocr.tessdata_dir.is_some() { "[SET]" } else { "[DEFAULT]" },
            self.catalog_path.as_deref().unwrap_or("built-in"),
        )
    }
}
