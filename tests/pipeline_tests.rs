//! # Scan Pipeline Integration Tests
//!
//! Exercises the full flow with in-memory OCR engines standing in for the
//! external service.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use image::{GrayImage, Luma};
    use pantry_receipts::config::AppConfig;
    use pantry_receipts::model::IssueCode;
    use pantry_receipts::ocr::{OcrEngine, OcrOutput};
    use pantry_receipts::ocr_errors::OcrError;
    use pantry_receipts::pipeline::{ReceiptScanner, ScanError};
    use pantry_receipts::preprocessing::{Adjustment, DecodeError, PreprocessedImage, RawImage};
    use pantry_receipts::Catalog;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const TRANSCRIPT: &str =
        "COSTCO\n2024-01-15\nMILK 2% 4.99\nBANANES 1 x 2.50 2.50\nRABAIS -1.00\nSOUS-TOTAL 6.49\nTOTAL 6.49";

    /// Returns a fixed transcript and counts calls
    struct FixedEngine {
        transcript: String,
        calls: AtomicUsize,
    }

    impl FixedEngine {
        fn new(transcript: &str) -> Self {
            Self {
                transcript: transcript.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OcrEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn recognize(&self, image: &PreprocessedImage) -> Result<OcrOutput, OcrError> {
            assert!(image.pixels().iter().all(|&p| p == 0 || p == 255));
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OcrOutput::new(self.transcript.clone(), 0.87))
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl OcrEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        async fn recognize(&self, _image: &PreprocessedImage) -> Result<OcrOutput, OcrError> {
            Err(OcrError::Initialization("no language data".to_string()))
        }
    }

    struct HangingEngine;

    #[async_trait]
    impl OcrEngine for HangingEngine {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn recognize(&self, _image: &PreprocessedImage) -> Result<OcrOutput, OcrError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(OcrOutput::new("too late", 1.0))
        }
    }

    fn receipt_photo() -> RawImage {
        let image = GrayImage::from_fn(32, 24, |_, y| if y % 6 < 2 { Luma([25]) } else { Luma([230]) });
        RawImage::new(image.into_raw(), 32, 24)
    }

    fn create_scanner(engine: Arc<dyn OcrEngine>) -> ReceiptScanner {
        let mut config = AppConfig::default();
        config.ocr.timeout_secs = 1;
        ReceiptScanner::new(config, Arc::new(Catalog::builtin()), engine)
    }

    #[tokio::test]
    async fn test_scan_produces_report() {
        let engine = Arc::new(FixedEngine::new(TRANSCRIPT));
        let scanner = create_scanner(engine.clone());

        let report = scanner.scan(receipt_photo(), None).await.unwrap();

        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            report.adjustments,
            vec![Adjustment::GrayscaleContrast, Adjustment::Sharpened, Adjustment::Thresholded]
        );
        assert_eq!(report.ocr_confidence, Some(0.87));
        assert_eq!(report.receipt.vendor.as_deref(), Some("COSTCO"));
        assert_eq!(report.receipt.items.len(), 2);
        assert_eq!(report.receipt.total, Some(6.49));
        assert!(!report.receipt.needs_review);
        assert!(report.validation.is_valid);
    }

    #[tokio::test]
    async fn test_vendor_hint_is_forwarded() {
        let scanner = create_scanner(Arc::new(FixedEngine::new(TRANSCRIPT)));
        let report = scanner.scan(receipt_photo(), Some("Costco Laval")).await.unwrap();
        assert_eq!(report.receipt.vendor.as_deref(), Some("Costco Laval"));
    }

    #[tokio::test]
    async fn test_ocr_failure_is_external_service_error() {
        let scanner = create_scanner(Arc::new(FailingEngine));

        let err = scanner.scan(receipt_photo(), None).await.unwrap_err();
        assert_eq!(
            err,
            ScanError::ExternalService(OcrError::Initialization("no language data".to_string()))
        );
    }

    #[tokio::test]
    async fn test_ocr_timeout_is_external_service_error() {
        let scanner = create_scanner(Arc::new(HangingEngine));

        let err = scanner.scan(receipt_photo(), None).await.unwrap_err();
        assert!(matches!(err, ScanError::ExternalService(OcrError::Timeout(_))));
        assert!(err.to_string().contains("hanging"));
    }

    #[tokio::test]
    async fn test_undecodable_photo_never_reaches_ocr() {
        let engine = Arc::new(FixedEngine::new(TRANSCRIPT));
        let scanner = create_scanner(engine.clone());

        let err = scanner.scan(RawImage::new(Vec::new(), 10, 10), None).await.unwrap_err();
        assert_eq!(err, ScanError::Decode(DecodeError::EmptyBuffer));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_transcript_is_reported_not_failed() {
        let scanner = create_scanner(Arc::new(FixedEngine::new("")));

        let report = scanner.scan(receipt_photo(), None).await.unwrap();
        assert!(report.receipt.needs_review);
        assert!(!report.validation.is_valid);
        assert!(report.validation.has_issue(IssueCode::LowQuality));
    }

    #[tokio::test]
    async fn test_analyze_transcript_matches_direct_calls() {
        let scanner = create_scanner(Arc::new(FailingEngine));
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let report = scanner
            .analyze_transcript_with_reference(TRANSCRIPT, None, today)
            .await;

        assert!(report.adjustments.is_empty());
        assert_eq!(report.ocr_confidence, None);
        assert_eq!(
            report.receipt,
            scanner.parser().parse_with_reference(TRANSCRIPT, None, today)
        );
        assert_eq!(report.validation, scanner.validator().validate(TRANSCRIPT));
    }

    #[tokio::test]
    async fn test_report_serializes_camel_case() {
        let scanner = create_scanner(Arc::new(FixedEngine::new(TRANSCRIPT)));
        let report = scanner.scan(receipt_photo(), None).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["adjustments"][0], "Grayscale+Contrast");
        assert!(json["ocrConfidence"].is_number());
        assert_eq!(json["receipt"]["vendor"], "COSTCO");
        assert_eq!(json["validation"]["isValid"], true);
    }
}
