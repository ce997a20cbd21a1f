//! # Receipt Data Model
//!
//! Terminal output records of the pipeline. They serialize to the camelCase JSON
//! record the inventory side consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed, closed set of grocery categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fruits,
    Vegetables,
    Dairy,
    Meat,
    Poultry,
    Seafood,
    Bakery,
    Frozen,
    Beverages,
    Snacks,
    Pantry,
    Household,
    Other,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 13] = [
        Category::Fruits,
        Category::Vegetables,
        Category::Dairy,
        Category::Meat,
        Category::Poultry,
        Category::Seafood,
        Category::Bakery,
        Category::Frozen,
        Category::Beverages,
        Category::Snacks,
        Category::Pantry,
        Category::Household,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fruits => "fruits",
            Category::Vegetables => "vegetables",
            Category::Dairy => "dairy",
            Category::Meat => "meat",
            Category::Poultry => "poultry",
            Category::Seafood => "seafood",
            Category::Bakery => "bakery",
            Category::Frozen => "frozen",
            Category::Beverages => "beverages",
            Category::Snacks => "snacks",
            Category::Pantry => "pantry",
            Category::Household => "household",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// One purchased product entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    pub brand: Option<String>,
    /// Always at least 1; weighed items keep 1 and record their unit.
    pub quantity: u32,
    /// Right-most amount on the line; never negative.
    pub total_price: f64,
    pub unit_price: Option<f64>,
    pub unit: Option<String>,
    pub category: Category,
    pub estimated_expiry_date: NaiveDate,
    /// Extraction confidence in `[0, 1]`
    pub confidence: f32,
    pub needs_review: bool,
}

/// A negative monetary adjustment tied to a coupon or promotion line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub label: String,
    /// Always `<= 0`, whatever sign convention the receipt used.
    pub amount: f64,
}

impl Discount {
    pub fn new(label: impl Into<String>, amount: f64) -> Self {
        Self {
            label: label.into(),
            amount: -amount.abs(),
        }
    }
}

/// Structured receipt recovered from one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReceipt {
    pub vendor: Option<String>,
    pub date: Option<NaiveDate>,
    pub currency: String,
    pub items: Vec<LineItem>,
    pub discounts: Vec<Discount>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub total: Option<f64>,
    pub raw_text: String,
    pub needs_review: bool,
    pub review_reasons: Vec<String>,
}

impl ParsedReceipt {
    /// Creates an empty receipt for `raw_text`.
    pub fn empty(raw_text: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            vendor: None,
            date: None,
            currency: currency.into(),
            items: Vec::new(),
            discounts: Vec::new(),
            subtotal: None,
            tax: None,
            total: None,
            raw_text: raw_text.into(),
            needs_review: false,
            review_reasons: Vec::new(),
        }
    }

    /// Records a review reason; `needs_review` follows the reason list.
    pub fn add_review_reason(&mut self, reason: impl Into<String>) {
        self.review_reasons.push(reason.into());
        self.needs_review = true;
    }

    /// Sum of item line totals.
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|item| item.total_price).sum()
    }

    /// Sum of discount amounts (non-positive).
    pub fn discounts_total(&self) -> f64 {
        self.discounts.iter().map(|discount| discount.amount).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Stable machine-readable identifiers for validation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    LowQuality,
    PartialReceipt,
    NoPrices,
    MultipleReceipts,
    NonGrocery,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::LowQuality => "LOW_QUALITY",
            IssueCode::PartialReceipt => "PARTIAL_RECEIPT",
            IssueCode::NoPrices => "NO_PRICES",
            IssueCode::MultipleReceipts => "MULTIPLE_RECEIPTS",
            IssueCode::NonGrocery => "NON_GROCERY",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fr")]
    French,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub detected_language: Language,
}

impl ValidationResult {
    /// Builds a result whose validity is derived from the issue severities.
    pub fn from_issues(issues: Vec<ValidationIssue>, detected_language: Language) -> Self {
        let is_valid = !issues
            .iter()
            .any(|issue| issue.severity == Severity::Error);
        Self {
            is_valid,
            issues,
            detected_language,
        }
    }

    pub fn has_issue(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}
