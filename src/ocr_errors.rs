//! # OCR Error Types Module
//!
//! Errors raised at the OCR service boundary. Any of these is fatal to the scan
//! that produced it; retrying is the caller's concern.

/// Custom error types for OCR operations
#[derive(Debug, Clone, PartialEq)]
pub enum OcrError {
    /// OCR engine initialization errors
    Initialization(String),
    /// Preprocessed pixels could not be encoded for the engine
    ImageEncode(String),
    /// Text extraction errors
    Extraction(String),
    /// Timeout errors
    Timeout(String),
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::Initialization(msg) => {
                write!(f, "[OCR_INIT] OCR engine initialization failed: {}", msg)
            }
            OcrError::ImageEncode(msg) => {
                write!(f, "[IMAGE_ENCODE] Failed to encode image for OCR processing: {}", msg)
            }
            OcrError::Extraction(msg) => {
                write!(f, "[OCR_EXTRACT] Text extraction from image failed: {}", msg)
            }
            OcrError::Timeout(msg) => write!(f, "[OCR_TIMEOUT] OCR processing timed out: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}
