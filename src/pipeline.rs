//! # Receipt Scanning Pipeline
//!
//! Wires the stages together:
//!
//! ```text
//! raw image -> preprocess -> OCR engine -> transcript -> { parse || validate } -> report
//! ```
//!
//! Preprocessing is CPU-bound and runs on a blocking task; it completes before the
//! OCR call since the pixel buffer is produced as a whole. The OCR call is the only
//! suspension point and the only place with a timeout. Parsing and validation read
//! the same immutable transcript and run concurrently. Nothing is retried here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::errors::error_logging;
use crate::errors::AppError;
use crate::model::{ParsedReceipt, ValidationResult};
use crate::ocr::OcrEngine;
use crate::ocr_errors::OcrError;
use crate::parser::ReceiptParser;
use crate::preprocessing::{preprocess, Adjustment, DecodeError, RawImage};
use crate::validation::ReceiptValidator;

/// Failures that abort a scan
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Pixels could not be interpreted
    Decode(DecodeError),
    /// The OCR service failed or timed out
    ExternalService(OcrError),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Decode(err) => write!(f, "[DECODE] {}", err),
            ScanError::ExternalService(err) => write!(f, "[EXTERNAL_SERVICE] {}", err),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Decode(err) => Some(err),
            ScanError::ExternalService(err) => Some(err),
        }
    }
}

impl From<DecodeError> for ScanError {
    fn from(err: DecodeError) -> Self {
        ScanError::Decode(err)
    }
}

impl From<OcrError> for ScanError {
    fn from(err: OcrError) -> Self {
        ScanError::ExternalService(err)
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Decode(err) => err.into(),
            ScanError::ExternalService(err) => err.into(),
        }
    }
}

/// Everything one scan produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Preprocessing steps applied; empty for text-only analysis
    pub adjustments: Vec<Adjustment>,
    pub ocr_confidence: Option<f32>,
    pub receipt: ParsedReceipt,
    pub validation: ValidationResult,
}

/// End-to-end receipt scanner
pub struct ReceiptScanner {
    config: AppConfig,
    parser: Arc<ReceiptParser>,
    validator: Arc<ReceiptValidator>,
    engine: Arc<dyn OcrEngine>,
}

impl ReceiptScanner {
    pub fn new(config: AppConfig, catalog: Arc<Catalog>, engine: Arc<dyn OcrEngine>) -> Self {
        let parser = ReceiptParser::new(Arc::clone(&catalog), config.parser.clone());
        let validator = ReceiptValidator::new(catalog, config.validation.clone());
        Self {
            config,
            parser: Arc::new(parser),
            validator: Arc::new(validator),
            engine,
        }
    }

    pub fn parser(&self) -> &ReceiptParser {
        &self.parser
    }

    pub fn validator(&self) -> &ReceiptValidator {
        &self.validator
    }

    /// Scans a raw receipt photo.
    pub async fn scan(&self, raw: RawImage, vendor_hint: Option<&str>) -> Result<ScanReport, ScanError> {
        let start_time = Instant::now();
        let declared = (raw.width(), raw.height());
        let byte_len = raw.bytes().len();

        let preprocessing_config = self.config.preprocessing.clone();
        let preprocessed = tokio::task::spawn_blocking(move || preprocess(&raw, &preprocessing_config))
            .await
            .unwrap_or_else(|join_error| {
                Err(DecodeError::Undecodable {
                    message: format!("Preprocessing task failed: {join_error}"),
                })
            });
        let image = match preprocessed {
            Ok(image) => image,
            Err(err) => {
                error_logging::log_decode_error(&err, declared, byte_len);
                crate::observability::record_scan_metrics(false, start_time.elapsed());
                return Err(ScanError::Decode(err));
            }
        };

        let ocr_start = Instant::now();
        let timeout_secs = self.config.ocr.timeout_secs;
        let recognized = tokio::time::timeout(Duration::from_secs(timeout_secs), self.engine.recognize(&image))
            .await
            .unwrap_or_else(|_| {
                Err(OcrError::Timeout(format!(
                    "{} did not answer within {} seconds",
                    self.engine.name(),
                    timeout_secs
                )))
            });
        let ocr_duration = ocr_start.elapsed();
        crate::observability::record_ocr_metrics(recognized.is_ok(), ocr_duration);

        let output = match recognized {
            Ok(output) => output,
            Err(err) => {
                error_logging::log_ocr_error(&err, self.engine.name(), Some(image.dimensions()), Some(ocr_duration));
                crate::observability::record_scan_metrics(false, start_time.elapsed());
                return Err(ScanError::ExternalService(err));
            }
        };

        if output.transcript.trim().is_empty() {
            warn!(engine = self.engine.name(), "OCR returned an empty transcript");
        }

        let mut report = self.analyze_transcript(&output.transcript, vendor_hint).await;
        report.adjustments = image.adjustments().to_vec();
        report.ocr_confidence = Some(output.confidence);

        crate::observability::record_scan_metrics(true, start_time.elapsed());
        info!(
            engine = self.engine.name(),
            ocr_confidence = output.confidence,
            items = report.receipt.items.len(),
            needs_review = report.receipt.needs_review,
            is_valid = report.validation.is_valid,
            total_time_ms = start_time.elapsed().as_millis() as u64,
            "Receipt scan completed"
        );
        Ok(report)
    }

    /// Parses and validates an already recognized transcript concurrently.
    pub async fn analyze_transcript(&self, transcript: &str, vendor_hint: Option<&str>) -> ScanReport {
        self.analyze(transcript, vendor_hint, None).await
    }

    /// Like [`analyze_transcript`](Self::analyze_transcript) with a fixed "today"
    /// for receipts without a date.
    pub async fn analyze_transcript_with_reference(
        &self,
        transcript: &str,
        vendor_hint: Option<&str>,
        today: NaiveDate,
    ) -> ScanReport {
        self.analyze(transcript, vendor_hint, Some(today)).await
    }

    async fn analyze(&self, transcript: &str, vendor_hint: Option<&str>, today: Option<NaiveDate>) -> ScanReport {
        let shared: Arc<str> = Arc::from(transcript);
        let hint = vendor_hint.map(str::to_string);

        let parser = Arc::clone(&self.parser);
        let parse_text = Arc::clone(&shared);
        let parse_hint = hint.clone();
        let parse_task = tokio::task::spawn_blocking(move || match today {
            Some(today) => parser.parse_with_reference(&parse_text, parse_hint.as_deref(), today),
            None => parser.parse(&parse_text, parse_hint.as_deref()),
        });

        let validator = Arc::clone(&self.validator);
        let validate_text = Arc::clone(&shared);
        let validate_task = tokio::task::spawn_blocking(move || validator.validate(&validate_text));

        let (receipt, validation) = tokio::join!(parse_task, validate_task);

        let receipt = join_or_else(receipt, || match today {
            Some(today) => self.parser.parse_with_reference(&shared, hint.as_deref(), today),
            None => self.parser.parse(&shared, hint.as_deref()),
        });
        let validation = join_or_else(validation, || self.validator.validate(&shared));

        ScanReport {
            adjustments: Vec::new(),
            ocr_confidence: None,
            receipt,
            validation,
        }
    }
}

/// Unwraps a finished blocking task; panics are resumed, a cancelled task is
/// redone inline.
fn join_or_else<T>(result: Result<T, JoinError>, inline: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => {
            warn!(error = %err, "Blocking task cancelled, running inline");
            inline()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_display_and_source() {
        let err = ScanError::from(DecodeError::EmptyBuffer);
        assert_eq!(err.to_string(), "[DECODE] Image buffer is empty");
        assert!(std::error::Error::source(&err).is_some());

        let err = ScanError::from(OcrError::Timeout("30s".to_string()));
        assert!(err.to_string().starts_with("[EXTERNAL_SERVICE] [OCR_TIMEOUT]"));
    }

    #[test]
    fn test_scan_error_into_app_error() {
        let app: AppError = ScanError::Decode(DecodeError::EmptyBuffer).into();
        assert!(matches!(app, AppError::Decode(_)));
        let app: AppError = ScanError::ExternalService(OcrError::Extraction("x".into())).into();
        assert!(matches!(app, AppError::ExternalService(_)));
    }
}
