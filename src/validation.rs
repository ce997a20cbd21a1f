//! # Validation Module
//!
//! Runs a fixed battery of independent checks against a raw transcript and
//! explains why a photo may not be usable. Each check contributes at most one
//! issue, in check order. Validation never fails; even an empty string yields a
//! result (low quality and no prices at the same time).

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::ValidationConfig;
use crate::model::{IssueCode, Language, Severity, ValidationIssue, ValidationResult};
use crate::text_processing::{count_money_tokens, KeywordSet};

lazy_static! {
    static ref HEADER_KEYWORDS: KeywordSet = KeywordSet::new(&[
        "store", "market", "supermarket", "marché", "supermarché", "receipt", "reçu", "grocery",
        "épicerie", "magasin",
    ])
    .expect("Header keywords should compile");
    static ref FOOTER_KEYWORDS: KeywordSet = KeywordSet::new(&[
        "total", "thank", "thanks", "thank you", "merci", "balance", "solde", "change", "monnaie",
    ])
    .expect("Footer keywords should compile");
    static ref RESTAURANT_KEYWORDS: KeywordSet = KeywordSet::new(&[
        "server", "serveur", "serveuse", "tip", "tips", "pourboire", "gratuity",
    ])
    .expect("Restaurant keywords should compile");
    static ref GAS_STATION_KEYWORDS: KeywordSet = KeywordSet::new(&[
        "gallon", "gallons", "pump", "pompe", "fuel", "essence", "carburant",
    ])
    .expect("Gas station keywords should compile");
    static ref FRENCH_KEYWORDS: KeywordSet = KeywordSet::new(&[
        "sous-total", "taxe", "taxes", "tps", "tvq", "merci", "rabais", "montant", "monnaie", "caisse",
        "épicerie", "achat", "reçu", "facture", "comptant", "prix", "articles", "économies",
    ])
    .expect("French keywords should compile");
    static ref ENGLISH_KEYWORDS: KeywordSet = KeywordSet::new(&[
        "subtotal", "tax", "thank", "change", "cash", "receipt", "savings", "items", "price", "balance",
        "store", "purchase", "discount", "coupon",
    ])
    .expect("English keywords should compile");
    // Subtotal forms are captured so they can be left out of the TOTAL count
    static ref TOTAL_PATTERN: Regex = Regex::new(r"(?i)\b(?P<sub>(?:sous|sub)[- ]?)?total\b")
        .expect("Total pattern should be valid");
    static ref PHONE_PATTERN: Regex =
        Regex::new(r"(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b").expect("Phone pattern should be valid");
}

/// Receipt transcript validator
#[derive(Debug, Clone)]
pub struct ReceiptValidator {
    catalog: Arc<Catalog>,
    config: ValidationConfig,
}

impl ReceiptValidator {
    pub fn new(catalog: Arc<Catalog>, config: ValidationConfig) -> Self {
        Self { catalog, config }
    }

    /// Validates `transcript`; `is_valid` is false iff an error-severity issue is present.
    pub fn validate(&self, transcript: &str) -> ValidationResult {
        let mut issues = Vec::new();

        if let Some(issue) = self.check_quality(transcript) {
            issues.push(issue);
        }
        if let Some(issue) = self.check_completeness(transcript) {
            issues.push(issue);
        }
        if let Some(issue) = self.check_prices(transcript) {
            issues.push(issue);
        }
        if let Some(issue) = self.check_multiple_receipts(transcript) {
            issues.push(issue);
        }
        if let Some(issue) = self.check_grocery(transcript) {
            issues.push(issue);
        }

        let language = self.detect_language(transcript);
        let result = ValidationResult::from_issues(issues, language);

        crate::observability::record_validation_metrics(&result);
        info!(
            target: "receipt_validation",
            is_valid = result.is_valid,
            issues = result.issues.len(),
            language = ?result.detected_language,
            "Transcript validated"
        );

        result
    }

    fn check_quality(&self, transcript: &str) -> Option<ValidationIssue> {
        let length = transcript.trim().chars().count();
        (length < self.config.min_transcript_chars).then(|| {
            issue(
                Severity::Error,
                IssueCode::LowQuality,
                format!("Only {} characters of text were recognized", length),
                "Retake the photo with better lighting and the receipt filling the frame",
            )
        })
    }

    fn check_completeness(&self, transcript: &str) -> Option<ValidationIssue> {
        let has_header = HEADER_KEYWORDS.is_match(transcript) || PHONE_PATTERN.is_match(transcript);
        let has_footer = FOOTER_KEYWORDS.is_match(transcript);
        debug!(target: "receipt_validation", has_header, has_footer, "Completeness indicators");

        (!has_header && !has_footer).then(|| {
            issue(
                Severity::Warning,
                IssueCode::PartialReceipt,
                "Neither the store header nor the totals footer could be found",
                "Make sure the whole receipt, top to bottom, is in the photo",
            )
        })
    }

    fn check_prices(&self, transcript: &str) -> Option<ValidationIssue> {
        let prices = count_money_tokens(transcript);
        (prices < self.config.min_price_tokens).then(|| {
            issue(
                Severity::Error,
                IssueCode::NoPrices,
                format!("Found {} price(s); a receipt needs at least {}", prices, self.config.min_price_tokens),
                "Check that the price column is visible and in focus",
            )
        })
    }

    fn check_multiple_receipts(&self, transcript: &str) -> Option<ValidationIssue> {
        let vendors = self.catalog.vendors_in(transcript);
        let totals = count_grand_totals(transcript);

        (vendors.len() > 1 || totals > self.config.max_total_keywords).then(|| {
            let message = if vendors.len() > 1 {
                format!("Several store names were found: {}", vendors.join(", "))
            } else {
                format!("The word TOTAL appears {} times", totals)
            };
            issue(
                Severity::Warning,
                IssueCode::MultipleReceipts,
                message,
                "Photograph one receipt at a time",
            )
        })
    }

    fn check_grocery(&self, transcript: &str) -> Option<ValidationIssue> {
        if RESTAURANT_KEYWORDS.is_match(transcript) {
            return Some(issue(
                Severity::Error,
                IssueCode::NonGrocery,
                "This looks like a restaurant bill",
                "Only grocery receipts can be added to the pantry",
            ));
        }
        GAS_STATION_KEYWORDS.is_match(transcript).then(|| {
            issue(
                Severity::Error,
                IssueCode::NonGrocery,
                "This looks like a gas station receipt",
                "Only grocery receipts can be added to the pantry",
            )
        })
    }

    /// French wins only with more distinct keyword hits than English and more
    /// than the configured floor.
    pub fn detect_language(&self, transcript: &str) -> Language {
        let french = FRENCH_KEYWORDS.count_distinct(transcript);
        let english = ENGLISH_KEYWORDS.count_distinct(transcript);
        debug!(target: "receipt_validation", french, english, "Language keyword hits");

        if french > english && french > self.config.french_keyword_floor {
            Language::French
        } else {
            Language::English
        }
    }
}

/// Occurrences of TOTAL that are not part of a subtotal, in either language.
fn count_grand_totals(transcript: &str) -> usize {
    TOTAL_PATTERN
        .captures_iter(transcript)
        .filter(|capture| capture.name("sub").is_none())
        .count()
}

fn issue(
    severity: Severity,
    code: IssueCode,
    message: impl Into<String>,
    suggestion: impl Into<String>,
) -> ValidationIssue {
    ValidationIssue {
        severity,
        code,
        message: message.into(),
        suggestion: suggestion.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ReceiptValidator {
        ReceiptValidator::new(Arc::new(Catalog::builtin()), ValidationConfig::default())
    }

    fn codes(result: &ValidationResult) -> Vec<IssueCode> {
        result.issues.iter().map(|issue| issue.code).collect()
    }

    #[test]
    fn test_short_transcript() {
        let result = validator().validate("xyz");
        assert!(!result.is_valid);
        assert!(result.has_issue(IssueCode::LowQuality));
        assert!(result.has_issue(IssueCode::NoPrices));
    }

    #[test]
    fn test_empty_transcript_still_returns_result() {
        let result = validator().validate("");
        assert_eq!(
            codes(&result),
            vec![IssueCode::LowQuality, IssueCode::PartialReceipt, IssueCode::NoPrices]
        );
        assert_eq!(result.detected_language, Language::English);
    }

    #[test]
    fn test_restaurant_bill() {
        let result = validator().validate("BISTRO\nSERVER: ALEX\nBURGER 15.00\nGRATUITY 2.25\nTOTAL 17.25");
        assert!(!result.is_valid);
        let non_grocery: Vec<_> = result
            .issues
            .iter()
            .filter(|issue| issue.code == IssueCode::NonGrocery)
            .collect();
        assert_eq!(non_grocery.len(), 1);
        assert!(non_grocery[0].message.contains("restaurant"));
    }

    #[test]
    fn test_gas_station() {
        let result = validator().validate("PETRO\nPUMP 4\nREGULAR 40.00\nTOTAL 40.00\nTHANK YOU");
        assert_eq!(codes(&result), vec![IssueCode::NonGrocery]);
    }

    #[test]
    fn test_warnings_do_not_block_validity() {
        let result = validator().validate("COSTCO\nMILK 4.99\nBREAD 2.49\nWALMART\nTOTAL 7.48");
        assert!(result.is_valid);
        assert_eq!(codes(&result), vec![IssueCode::MultipleReceipts]);
    }

    #[test]
    fn test_repeated_vendor_is_one_receipt() {
        let result = validator().validate("COSTCO\nMILK 4.99\nBREAD 2.49\nTOTAL 7.48\nCOSTCO");
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_too_many_totals() {
        let result = validator().validate("MILK 4.99\nTOTAL 4.99\nBREAD 2.49\nTOTAL 2.49\nTOTAL 7.48");
        assert!(result.has_issue(IssueCode::MultipleReceipts));
    }

    #[test]
    fn test_subtotals_are_not_counted_as_totals() {
        assert_eq!(count_grand_totals("SUBTOTAL 7.48\nTOTAL 7.48"), 1);
        assert_eq!(count_grand_totals("SOUS-TOTAL 7.48\nTOTAL 7.48"), 1);
        assert_eq!(count_grand_totals("Sous total 7.48\nsub-total 7.48\nTOTALLY"), 0);
        assert_eq!(count_grand_totals("TOTAL\nTOTAL TPS\nTOTAL"), 3);
    }

    #[test]
    fn test_subtotal_language_does_not_change_receipt_count() {
        let v = validator();
        let english = v.validate("MILK 4.99\nSUBTOTAL 4.99\nTOTAL 4.99\nBREAD 2.49\nTOTAL 2.49");
        let french = v.validate("MILK 4.99\nSOUS-TOTAL 4.99\nTOTAL 4.99\nBREAD 2.49\nTOTAL 2.49");
        assert!(!english.has_issue(IssueCode::MultipleReceipts));
        assert!(!french.has_issue(IssueCode::MultipleReceipts));
    }

    #[test]
    fn test_phone_number_counts_as_header() {
        let v = validator();
        assert!(v.check_completeness("(514) 555-1234\nMILK 4.99").is_none());
        assert!(v.check_completeness("514-555-1234\nMILK 4.99").is_none());
        assert!(v.check_completeness("MILK 4.99\nBREAD 2.49").is_some());
    }

    #[test]
    fn test_language_detection() {
        let v = validator();
        let french = "ÉPICERIE\nSOUS-TOTAL 6.49\nTPS 0.32\nTVQ 0.65\nMERCI";
        assert_eq!(v.detect_language(french), Language::French);

        // Two French words are not above the floor
        assert_eq!(v.detect_language("RABAIS\nSOUS-TOTAL"), Language::English);

        let mixed = "SUBTOTAL TAX CASH CHANGE\nTPS TVQ MERCI";
        assert_eq!(v.detect_language(mixed), Language::English);
    }
}
