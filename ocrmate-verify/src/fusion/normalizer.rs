// Value Normalizer - Canonical Comparable Forms
//
// Converts a raw extracted value into the form its semantic type compares in:
// case-folded text, a numeric magnitude, or a calendar date.

use crate::types::{RawValue, SemanticType};
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Currency symbols stripped before numeric parsing
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩', '₽', '¢', '₺', '₪'];

/// Grouping separators stripped before numeric parsing
const GROUPING_SEPARATORS: &[char] = &[',', '_', '\'', '\u{a0}', '\u{202f}'];

/// ISO 4217 code length
const CURRENCY_CODE_LEN: usize = 3;

/// Date formats tried in order: day/month/year, month/day/year, ISO, then
/// spelled-out months. First successful parse wins.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Boolean vocabulary accepted from either source
pub const TRUE_WORDS: &[&str] = &["yes", "true", "1", "y"];
pub const FALSE_WORDS: &[&str] = &["no", "false", "0", "n"];

/// Canonical comparable form of one value
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    /// Trimmed, case-folded text
    Text(String),
    /// Parsed numeric magnitude
    Number(f64),
    /// Canonical calendar date
    Date(NaiveDate),
}

impl NormalizedValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            NormalizedValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Text(s) => f.write_str(s),
            NormalizedValue::Number(n) => write!(f, "{}", n),
            NormalizedValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A value could not be brought into its type's canonical form
///
/// Recovered locally: the comparator treats the value as absent.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot normalize '{raw}' as {semantic_type}: {reason}")]
pub struct NormalizationError {
    pub raw: String,
    pub semantic_type: SemanticType,
    pub reason: String,
}

impl NormalizationError {
    fn new(raw: &RawValue, semantic_type: SemanticType, reason: &str) -> Self {
        Self {
            raw: raw.to_string(),
            semantic_type,
            reason: reason.to_string(),
        }
    }
}

/// Normalize a raw value for comparison under its semantic type
pub fn normalize(
    raw: &RawValue,
    semantic_type: SemanticType,
) -> Result<NormalizedValue, NormalizationError> {
    match semantic_type {
        SemanticType::Number | SemanticType::Currency => normalize_number(raw, semantic_type),
        SemanticType::Date => normalize_date(raw),
        SemanticType::Boolean => normalize_boolean(raw),
        SemanticType::Text | SemanticType::Email | SemanticType::Phone | SemanticType::Address => {
            fold_text(raw, semantic_type)
        }
    }
}

/// Normalize an optional raw value, logging and discarding failures
///
/// Returns `None` for both an absent value and one that failed normalization.
pub fn normalize_optional(
    raw: Option<&RawValue>,
    semantic_type: SemanticType,
    field_name: &str,
) -> Option<NormalizedValue> {
    let raw = raw?;
    match normalize(raw, semantic_type) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Field '{}': {} (treated as absent)", field_name, e);
            None
        }
    }
}

fn folded(raw: &RawValue, semantic_type: SemanticType) -> Result<String, NormalizationError> {
    let folded = raw.to_string().trim().to_lowercase();
    if folded.is_empty() {
        return Err(NormalizationError::new(raw, semantic_type, "blank value"));
    }
    Ok(folded)
}

fn fold_text(
    raw: &RawValue,
    semantic_type: SemanticType,
) -> Result<NormalizedValue, NormalizationError> {
    folded(raw, semantic_type).map(NormalizedValue::Text)
}

fn normalize_boolean(raw: &RawValue) -> Result<NormalizedValue, NormalizationError> {
    if let RawValue::Bool(b) = raw {
        return Ok(NormalizedValue::Text(b.to_string()));
    }

    let folded = folded(raw, SemanticType::Boolean)?;
    if TRUE_WORDS.contains(&folded.as_str()) {
        Ok(NormalizedValue::Text("true".to_string()))
    } else if FALSE_WORDS.contains(&folded.as_str()) {
        Ok(NormalizedValue::Text("false".to_string()))
    } else {
        Ok(NormalizedValue::Text(folded))
    }
}

fn normalize_number(
    raw: &RawValue,
    semantic_type: SemanticType,
) -> Result<NormalizedValue, NormalizationError> {
    let value = match raw {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => parse_number(s)
            .ok_or_else(|| NormalizationError::new(raw, semantic_type, "not a number"))?,
        RawValue::Bool(_) => {
            return Err(NormalizationError::new(raw, semantic_type, "boolean is not numeric"))
        }
    };

    if !value.is_finite() {
        return Err(NormalizationError::new(raw, semantic_type, "not a finite number"));
    }
    Ok(NormalizedValue::Number(value))
}

/// Parse a number out of text like "$1,234.50", "USD 12", "(3.00)" or "1 000"
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let parenthesized = trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')'));
    let (negative_parens, inner) = match parenthesized {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| {
            !CURRENCY_SYMBOLS.contains(c) && !GROUPING_SEPARATORS.contains(c) && !c.is_whitespace()
        })
        .collect();
    let cleaned = strip_currency_code(&cleaned);
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    Some(if negative_parens { -value } else { value })
}

/// Strip a three-letter currency code ("USD", "eur") before or after the digits
fn strip_currency_code(text: &str) -> &str {
    let leading = text.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let text = if leading == CURRENCY_CODE_LEN { &text[leading..] } else { text };

    let trailing = text.chars().rev().take_while(|c| c.is_ascii_alphabetic()).count();
    if trailing == CURRENCY_CODE_LEN {
        &text[..text.len() - trailing]
    } else {
        text
    }
}

fn normalize_date(raw: &RawValue) -> Result<NormalizedValue, NormalizationError> {
    let RawValue::Text(text) = raw else {
        return Err(NormalizationError::new(raw, SemanticType::Date, "date must be text"));
    };
    parse_date(text).map(NormalizedValue::Date).ok_or_else(|| {
        NormalizationError::new(raw, SemanticType::Date, "no known date format matched")
    })
}

/// Parse a calendar date with the ordered list of known formats
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    // ISO timestamps carry the date in front
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn test_text_trim_and_case_fold() {
        let result = normalize(&text("  ABC Corp \n"), SemanticType::Text).unwrap();
        assert_eq!(result, NormalizedValue::Text("abc corp".to_string()));
    }

    #[test]
    fn test_blank_text_fails() {
        assert!(normalize(&text("   "), SemanticType::Email).is_err());
    }

    #[test]
    fn test_currency_strips_symbols_and_grouping() {
        assert_eq!(
            normalize(&text("$1,234.50"), SemanticType::Currency).unwrap(),
            NormalizedValue::Number(1234.5)
        );
        assert_eq!(
            normalize(&text(" €  99 "), SemanticType::Currency).unwrap(),
            NormalizedValue::Number(99.0)
        );
        assert_eq!(
            normalize(&text("USD 12.00"), SemanticType::Currency).unwrap(),
            NormalizedValue::Number(12.0)
        );
    }

    #[test]
    fn test_letters_inside_number_rejected() {
        assert_eq!(parse_number("T0TAL"), None);
        assert_eq!(parse_number("12.5 eur"), Some(12.5));
        assert_eq!(parse_number("1,000,000"), Some(1_000_000.0));
    }

    #[test]
    fn test_parenthesized_amount_is_negative() {
        assert_eq!(parse_number("(3.50)"), Some(-3.5));
    }

    #[test]
    fn test_number_passthrough_and_failures() {
        assert_eq!(
            normalize(&RawValue::Number(25.99), SemanticType::Number).unwrap(),
            NormalizedValue::Number(25.99)
        );
        assert!(normalize(&text("twelve"), SemanticType::Number).is_err());
        assert!(normalize(&RawValue::Bool(true), SemanticType::Number).is_err());
        assert!(normalize(&RawValue::Number(f64::NAN), SemanticType::Number).is_err());
    }

    #[test]
    fn test_date_formats_share_canonical_form() {
        let expected = NormalizedValue::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        for input in ["15/03/2024", "03/15/2024", "2024-03-15", "15 March 2024", "Mar 15, 2024"] {
            assert_eq!(
                normalize(&text(input), SemanticType::Date).unwrap(),
                expected,
                "input {}",
                input
            );
        }
    }

    #[test]
    fn test_day_month_year_wins_when_ambiguous() {
        let date = parse_date("03/04/2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 3).unwrap());
    }

    #[test]
    fn test_rfc3339_timestamp_date() {
        assert_eq!(
            parse_date("2024-03-15T10:30:00Z"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn test_unparseable_date_fails() {
        assert!(normalize(&text("sometime in spring"), SemanticType::Date).is_err());
        assert!(normalize(&RawValue::Number(20240315.0), SemanticType::Date).is_err());
    }

    #[test]
    fn test_boolean_vocabulary() {
        let yes = normalize(&text(" Yes "), SemanticType::Boolean).unwrap();
        let t = normalize(&RawValue::Bool(true), SemanticType::Boolean).unwrap();
        assert_eq!(yes, t);
        assert_eq!(
            normalize(&text("N"), SemanticType::Boolean).unwrap(),
            NormalizedValue::Text("false".to_string())
        );
        assert_eq!(
            normalize(&text("Maybe"), SemanticType::Boolean).unwrap(),
            NormalizedValue::Text("maybe".to_string())
        );
    }

    #[test]
    fn test_normalize_optional_discards_failure() {
        assert!(normalize_optional(Some(&text("n/a")), SemanticType::Currency, "total").is_none());
        assert!(normalize_optional(None, SemanticType::Text, "name").is_none());
    }
}
