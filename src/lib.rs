//! # Pantry Receipts
//!
//! Turns a photographed grocery receipt into a structured, validated record of
//! purchased line items, discounts and totals for automatic inventory entry.
//!
//! The core is three pure, synchronous stages:
//! - [`preprocessing`]: conditions a raw photo for OCR (resize, grayscale, sharpen, Otsu)
//! - [`parser`]: recovers items, discounts and totals from noisy OCR text
//! - [`validation`]: scores transcript quality and explains failures
//!
//! OCR itself is an external collaborator behind the [`ocr::OcrEngine`] trait, and
//! [`pipeline::ReceiptScanner`] wires the stages together.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod health;
pub mod model;
pub mod observability;
pub mod ocr;
pub mod ocr_errors;
pub mod parser;
pub mod pipeline;
pub mod preprocessing;
pub mod shelf_life;
pub mod text_processing;
pub mod validation;

// Re-export types for easier access
pub use catalog::Catalog;
pub use model::{Category, Discount, LineItem, ParsedReceipt, ValidationResult};
pub use parser::ReceiptParser;
pub use preprocessing::{preprocess, PreprocessedImage, RawImage};
pub use validation::ReceiptValidator;
