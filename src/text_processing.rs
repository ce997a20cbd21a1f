//! # Text Processing Module
//!
//! Shared token grammar for receipt transcripts, used by both the parser and the
//! validator.
//!
//! ## Features
//!
//! - Money tokens with `.` or `,` decimal separators and exactly two fraction digits
//! - Leading (`-1.00`) and trailing (`3,80-`) minus conventions
//! - Date detection, year-first before day-first
//! - Whole-word, case-insensitive keyword sets for English and French

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use tracing::trace;

lazy_static! {
    // The fraction is captured greedily and length-checked afterwards so that
    // "12.499" or "514.555.1234" never yield a price. The consumed prefix keeps
    // a token from starting inside a longer digit run, so integer parts over
    // seven digits are rejected rather than truncated.
    static ref MONEY_PATTERN: Regex = Regex::new(
        r"(?:^|[^\d.,])(?P<tok>(?P<lead>-)?\$?(?P<int>\d{1,3}(?:,\d{3})+|\d{1,7})[.,](?P<frac>\d+)(?P<trail>-)?)"
    )
    .expect("Money pattern should be valid");
    static ref YEAR_FIRST_DATE: Regex =
        Regex::new(r"\b(?P<y>\d{4})[-/.](?P<m>\d{1,2})[-/.](?P<d>\d{1,2})\b")
            .expect("Year-first date pattern should be valid");
    static ref DAY_FIRST_DATE: Regex =
        Regex::new(r"\b(?P<d>\d{1,2})[-/.](?P<m>\d{1,2})[-/.](?P<y>\d{4})\b")
            .expect("Day-first date pattern should be valid");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("Whitespace pattern should be valid");
}

/// A price-shaped token found in a line
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyToken {
    /// Absolute value of the amount
    pub value: f64,
    /// `-` written immediately before the amount
    pub leading_minus: bool,
    /// `-` written immediately after the amount
    pub trailing_minus: bool,
    /// Byte offset where the token starts (including any sign or `$`)
    pub start: usize,
    /// Byte offset just past the token
    pub end: usize,
}

impl MoneyToken {
    pub fn is_negative(&self) -> bool {
        self.leading_minus || self.trailing_minus
    }

    /// Signed amount as written
    pub fn signed_value(&self) -> f64 {
        if self.is_negative() {
            -self.value
        } else {
            self.value
        }
    }
}

/// Parses a money string such as `"12,49"` or `"12.49"` into a number.
///
/// Exactly two fraction digits are required; a leading or trailing minus makes
/// the result negative.
///
/// # Examples
///
/// ```
/// use pantry_receipts::text_processing::parse_money;
///
/// assert_eq!(parse_money("12,49"), Some(12.49));
/// assert_eq!(parse_money("12.49"), Some(12.49));
/// assert_eq!(parse_money("3,80-"), Some(-3.80));
/// assert_eq!(parse_money("12.5"), None);
/// ```
pub fn parse_money(text: &str) -> Option<f64> {
    let text = text.trim();
    let token = find_money_tokens(text).into_iter().next()?;
    if token.start != 0 || token.end != text.len() {
        return None;
    }
    Some(token.signed_value())
}

/// Finds every money-shaped token in `line`, left to right.
pub fn find_money_tokens(line: &str) -> Vec<MoneyToken> {
    let mut tokens = Vec::new();

    for capture in MONEY_PATTERN.captures_iter(line) {
        let Some(token) = capture.name("tok") else {
            continue;
        };
        let (Some(int), Some(frac)) = (capture.name("int"), capture.name("frac")) else {
            continue;
        };
        if frac.as_str().len() != 2 {
            continue;
        }

        let trailing_minus = capture.name("trail").is_some();
        if !trailing_minus && continues_as_number(&line[token.end()..]) {
            trace!(token = token.as_str(), "Skipping money-shaped part of a longer number");
            continue;
        }

        // Thousands separators are dropped and a comma decimal separator is
        // converted before the numeric parse
        let normalized = format!("{}.{}", int.as_str().replace(',', ""), frac.as_str());
        let Ok(value) = normalized.parse::<f64>() else {
            continue;
        };

        tokens.push(MoneyToken {
            value,
            leading_minus: capture.name("lead").is_some(),
            trailing_minus,
            start: token.start(),
            end: token.end(),
        });
    }

    tokens
}

/// True when the text right after a candidate makes it part of a date, a
/// dotted number or a percentage.
fn continues_as_number(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some('%') => true,
        Some('.') | Some(',') => chars.next().map_or(false, |c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Number of money-shaped tokens in the whole text.
pub fn count_money_tokens(text: &str) -> usize {
    text.lines().map(|line| find_money_tokens(line).len()).sum()
}

/// Detects the first valid receipt date, trying year-first patterns before
/// day-first ones. An impossible day-first reading (e.g. `05/13/2024`) is
/// retried as month-first.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use pantry_receipts::text_processing::detect_date;
///
/// assert_eq!(detect_date("2024-01-15 14:32"), NaiveDate::from_ymd_opt(2024, 1, 15));
/// assert_eq!(detect_date("15/01/2024"), NaiveDate::from_ymd_opt(2024, 1, 15));
/// assert_eq!(detect_date("no date here"), None);
/// ```
pub fn detect_date(text: &str) -> Option<NaiveDate> {
    let number = |capture: &regex::Captures, name: &str| -> Option<u32> {
        capture.name(name)?.as_str().parse().ok()
    };

    for capture in YEAR_FIRST_DATE.captures_iter(text) {
        let (Some(y), Some(m), Some(d)) = (number(&capture, "y"), number(&capture, "m"), number(&capture, "d")) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(y as i32, m, d) {
            return Some(date);
        }
    }

    for capture in DAY_FIRST_DATE.captures_iter(text) {
        let (Some(y), Some(m), Some(d)) = (number(&capture, "y"), number(&capture, "m"), number(&capture, "d")) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(y as i32, m, d)
            .or_else(|| NaiveDate::from_ymd_opt(y as i32, d, m))
        {
            return Some(date);
        }
    }

    None
}

/// True when `line` contains something date-shaped.
pub fn line_has_date(line: &str) -> bool {
    YEAR_FIRST_DATE.is_match(line) || DAY_FIRST_DATE.is_match(line)
}

/// Collapses runs of whitespace and trims.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Case-insensitive, whole-word keyword matcher
#[derive(Debug, Clone)]
pub struct KeywordSet {
    pattern: Regex,
}

impl KeywordSet {
    /// Builds a matcher from static keywords; longer keywords are preferred.
    pub fn new(keywords: &[&str]) -> Result<Self, regex::Error> {
        let mut sorted: Vec<&str> = keywords.to_vec();
        sorted.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = sorted
            .iter()
            .map(|keyword| regex::escape(keyword))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))?;
        Ok(Self { pattern })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Total number of keyword occurrences
    pub fn count_occurrences(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }

    /// Number of different keywords present
    pub fn count_distinct(&self, text: &str) -> usize {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_normalization() {
        assert_eq!(parse_money("12,49"), Some(12.49));
        assert_eq!(parse_money("12.49"), Some(12.49));
        assert_eq!(parse_money("$4.99"), Some(4.99));
        assert_eq!(parse_money("-1.00"), Some(-1.0));
        assert_eq!(parse_money("3,80-"), Some(-3.8));
        assert_eq!(parse_money("12.499"), None);
        assert_eq!(parse_money("12"), None);
    }

    #[test]
    fn test_tokens_and_positions() {
        let tokens = find_money_tokens("BANANES 1 x 2.50 2.50");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].start, 17);
        assert_eq!(tokens[1].end, 21);
        assert!(!tokens[1].is_negative());
    }

    #[test]
    fn test_amount_never_starts_inside_a_longer_number() {
        assert!(find_money_tokens("REF 12345678.99").is_empty());
        assert_eq!(parse_money("99123,45"), Some(99123.45));
        assert_eq!(parse_money("1234567.89"), Some(1234567.89));

        let tokens = find_money_tokens("LOT 0012345678.99 4.99");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, 4.99);
        assert_eq!(tokens[0].start, 18);
    }

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(parse_money("1,234.56"), Some(1234.56));
        assert_eq!(parse_money("$12,345.00"), Some(12345.0));
        assert_eq!(parse_money("12,49"), Some(12.49));
        assert_eq!(parse_money("1,234"), None);

        let tokens = find_money_tokens("TV 1,234.56-");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].start, 3);
        assert_eq!(tokens[0].signed_value(), -1234.56);
    }

    #[test]
    fn test_trailing_minus_with_tax_flag() {
        let tokens = find_money_tokens("3,80-FP");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].trailing_minus);
        assert_eq!(tokens[0].signed_value(), -3.8);
    }

    #[test]
    fn test_dates_and_phones_are_not_prices() {
        assert!(find_money_tokens("15.01.2024").is_empty());
        assert!(find_money_tokens("TEL 514.555.1234").is_empty());
        assert!(find_money_tokens("MILK 2.5% 1L").is_empty());
        assert!(find_money_tokens("2024-01-15").is_empty());
    }

    #[test]
    fn test_count_money_tokens() {
        assert_eq!(count_money_tokens("A 1.00\nB 2,00\nC 3"), 2);
        assert_eq!(count_money_tokens(""), 0);
    }

    #[test]
    fn test_date_pattern_order() {
        // Year-first wins even when a day-first date appears earlier
        assert_eq!(
            detect_date("01/02/2023\n2024-01-15"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(detect_date("15.01.2024"), NaiveDate::from_ymd_opt(2024, 1, 15));
        // Month-first fallback for impossible day-first readings
        assert_eq!(detect_date("05/13/2024"), NaiveDate::from_ymd_opt(2024, 5, 13));
        assert_eq!(detect_date("2024-13-45"), None);
    }

    #[test]
    fn test_keyword_set() {
        let set = KeywordSet::new(&["total", "sous-total", "merci"]).unwrap();
        assert!(set.is_match("SOUS-TOTAL 6.49"));
        assert!(!set.is_match("TOTALLY"));
        assert_eq!(set.count_occurrences("TOTAL\nTOTAL\nsous-total"), 3);
        assert_eq!(set.count_distinct("TOTAL total MERCI"), 2);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  MILK   2%\t "), "MILK 2%");
    }
}
