//! # Application Error Types
//!
//! This module defines common error types used throughout the receipt pipeline.
//! Unparseable receipt text is deliberately absent: the parser reports it as data
//! (`needs_review` plus reasons), never as an error.

use std::fmt;

use crate::ocr_errors::OcrError;
use crate::preprocessing::DecodeError;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Image bytes could not be interpreted as pixels
    Decode(String),
    /// External OCR service failures
    ExternalService(String),
    /// File system errors
    Io(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Decode(msg) => write!(f, "[DECODE] {}", msg),
            AppError::ExternalService(msg) => write!(f, "[EXTERNAL_SERVICE] {}", msg),
            AppError::Io(msg) => write!(f, "[IO] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<OcrError> for AppError {
    fn from(err: OcrError) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the pipeline
pub mod error_logging {
    use tracing::error;

    /// Log preprocessing failures with the declared image geometry
    pub fn log_decode_error(
        error: &impl std::fmt::Display,
        declared_dimensions: (u32, u32),
        byte_len: usize,
    ) {
        error!(
            error = %error,
            declared_width = declared_dimensions.0,
            declared_height = declared_dimensions.1,
            byte_len = byte_len,
            "Receipt image could not be decoded"
        );
    }

    /// Log OCR processing errors with image and processing context
    pub fn log_ocr_error(
        error: &impl std::fmt::Display,
        operation: &str,
        image_dimensions: Option<(u32, u32)>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            image_dimensions = ?image_dimensions,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "OCR processing failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
