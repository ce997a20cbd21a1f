//! # OCR Boundary
//!
//! Character recognition is an external collaborator. The pipeline only sees
//! the [`OcrEngine`] trait: a preprocessed image goes in, a transcript with a
//! confidence comes out, and failures propagate as [`OcrError`] rather than an
//! empty transcript.
//!
//! With the `tesseract` feature enabled, [`TesseractEngine`] provides a local
//! implementation backed by `leptess`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ocr_errors::OcrError;
use crate::preprocessing::PreprocessedImage;

/// Text recognized from one receipt image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    pub transcript: String,
    /// Engine confidence in `[0, 1]`
    pub confidence: f32,
}

impl OcrOutput {
    pub fn new(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            transcript: transcript.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// External OCR service
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &str;

    async fn recognize(&self, image: &PreprocessedImage) -> Result<OcrOutput, OcrError>;
}

/// Trims every line and drops blank ones.
pub fn normalize_transcript(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngine;

#[cfg(feature = "tesseract")]
mod tesseract {
    use async_trait::async_trait;
    use leptess::LepTess;
    use std::time::Instant;
    use tracing::{debug, info};

    use super::{normalize_transcript, OcrEngine, OcrOutput};
    use crate::config::OcrConfig;
    use crate::ocr_errors::OcrError;
    use crate::preprocessing::PreprocessedImage;

    /// Local Tesseract engine. A fresh instance is created per call on a
    /// blocking thread, so the engine itself holds only configuration.
    #[derive(Debug, Clone)]
    pub struct TesseractEngine {
        languages: String,
        tessdata_dir: Option<String>,
    }

    impl TesseractEngine {
        pub fn new(config: &OcrConfig) -> Self {
            Self {
                languages: config.languages.clone(),
                tessdata_dir: config.tessdata_dir.clone(),
            }
        }

        fn recognize_blocking(
            languages: &str,
            tessdata_dir: Option<&str>,
            png: &[u8],
        ) -> Result<OcrOutput, OcrError> {
            let mut tess = LepTess::new(tessdata_dir, languages).map_err(|e| {
                OcrError::Initialization(format!("Failed to initialize Tesseract ({languages}): {e}"))
            })?;

            tess.set_image_from_mem(png)
                .map_err(|e| OcrError::ImageEncode(format!("Tesseract rejected the image: {e}")))?;

            let text = tess
                .get_utf8_text()
                .map_err(|e| OcrError::Extraction(format!("Failed to extract text from image: {e}")))?;
            let confidence = tess.mean_text_conf() as f32 / 100.0;

            Ok(OcrOutput::new(normalize_transcript(&text), confidence))
        }
    }

    #[async_trait]
    impl OcrEngine for TesseractEngine {
        fn name(&self) -> &str {
            "tesseract"
        }

        async fn recognize(&self, image: &PreprocessedImage) -> Result<OcrOutput, OcrError> {
            let start_time = Instant::now();
            let png = image
                .to_png()
                .map_err(|e| OcrError::ImageEncode(format!("Failed to encode PNG: {e}")))?;
            debug!(target: "receipt_ocr", png_bytes = png.len(), "Encoded image for Tesseract");

            let languages = self.languages.clone();
            let tessdata_dir = self.tessdata_dir.clone();
            let output = tokio::task::spawn_blocking(move || {
                Self::recognize_blocking(&languages, tessdata_dir.as_deref(), &png)
            })
            .await
            .map_err(|e| OcrError::Extraction(format!("OCR task failed: {e}")))??;

            info!(
                target: "receipt_ocr",
                characters = output.transcript.len(),
                confidence = output.confidence,
                ocr_time_ms = start_time.elapsed().as_millis() as u64,
                "Tesseract OCR completed"
            );
            Ok(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_transcript() {
        assert_eq!(
            normalize_transcript("  COSTCO \n\n   MILK 4.99  \r\n\nTOTAL 4.99\n"),
            "COSTCO\nMILK 4.99\nTOTAL 4.99"
        );
        assert_eq!(normalize_transcript("   "), "");
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(OcrOutput::new("x", 1.7).confidence, 1.0);
        assert_eq!(OcrOutput::new("x", -0.2).confidence, 0.0);
    }
}
