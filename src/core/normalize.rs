//! Field normalizers: raw text in, canonical typed value out.
//!
//! Normalizers never touch the rule bounds; they only decide whether a value has a
//! canonical form at all. Failures come back as a [`Violation`] carrying the
//! [`ErrorKind`] the row evaluator records.

use crate::domain::model::ErrorKind;
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;

/// A failed normalization or validation check, before it is tied to a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ErrorKind,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

const DEFAULT_NUMBER_WORDS: [(&str, f64); 27] = [
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
    ("eleven", 11.0),
    ("twelve", 12.0),
    ("thirteen", 13.0),
    ("fourteen", 14.0),
    ("fifteen", 15.0),
    ("sixteen", 16.0),
    ("seventeen", 17.0),
    ("eighteen", 18.0),
    ("nineteen", 19.0),
    ("twenty", 20.0),
    ("thirty", 30.0),
    ("forty", 40.0),
    ("fifty", 50.0),
    ("sixty", 60.0),
    ("seventy", 70.0),
    ("eighty", 80.0),
    ("ninety", 90.0),
];

/// Dictionary of spelled-out numbers accepted in front of a `k` suffix.
///
/// Keys are matched case-insensitively against the whole word; hyphenated
/// compounds such as `seventy-five` only resolve when they are keys themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberWords {
    words: BTreeMap<String, f64>,
}

impl Default for NumberWords {
    fn default() -> Self {
        Self {
            words: DEFAULT_NUMBER_WORDS
                .iter()
                .map(|(word, value)| (word.to_string(), *value))
                .collect(),
        }
    }
}

impl NumberWords {
    /// Default dictionary with `overrides` added on top.
    pub fn with_overrides(overrides: &BTreeMap<String, f64>) -> Result<Self> {
        let mut words = Self::default();
        for (word, value) in overrides {
            let key = word.trim().to_lowercase();
            if key.is_empty() {
                return Err(EtlError::InvalidConfigValueError {
                    field: "number_words".to_string(),
                    value: word.clone(),
                    reason: "Number words cannot be empty".to_string(),
                });
            }
            if !value.is_finite() {
                return Err(EtlError::InvalidConfigValueError {
                    field: "number_words".to_string(),
                    value: format!("{}={}", word, value),
                    reason: "Number word values must be finite".to_string(),
                });
            }
            words.words.insert(key, *value);
        }
        Ok(words)
    }

    pub fn lookup(&self, word: &str) -> Option<f64> {
        self.words.get(&word.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn parse_plain(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Converts salary text such as `"$85,000"`, `"85k"` or `"Seventy-K"` to a number.
pub fn normalize_salary(raw: &str, words: &NumberWords) -> std::result::Result<f64, Violation> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(Violation::new(ErrorKind::UnparsableSalary, "Salary is empty"));
    }

    if let Some(stem) = cleaned.strip_suffix(|c: char| c == 'k' || c == 'K') {
        let stem = stem.trim_end_matches(['-', '_']);
        let amount = parse_plain(stem).or_else(|| words.lookup(stem));
        if let Some(value) = amount {
            // 乘以千之後仍須為有限數值
            let value = value * 1000.0;
            if value.is_finite() {
                return Ok(value);
            }
            return Err(Violation::new(
                ErrorKind::UnparsableSalary,
                format!("Salary '{}' is out of the representable range", raw.trim()),
            ));
        }
        return Err(Violation::new(
            ErrorKind::UnparsableSalary,
            format!("Salary '{}' uses K-notation with an unknown amount '{}'", raw.trim(), stem),
        ));
    }

    parse_plain(&cleaned).ok_or_else(|| {
        Violation::new(
            ErrorKind::UnparsableSalary,
            format!("Salary '{}' is not a numeric value", raw.trim()),
        )
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePart {
    Year,
    Month,
    Day,
}

/// Expected date shape, compiled from `YYYY-MM-DD` or `%Y-%m-%d` style patterns.
#[derive(Debug, Clone)]
pub struct DateFormat {
    pattern: String,
    shape: Regex,
    parts: Vec<DatePart>,
}

impl DateFormat {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| EtlError::InvalidConfigValueError {
            field: "date_rules.expected_format".to_string(),
            value: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.trim().is_empty() {
            return Err(invalid("Date format cannot be empty"));
        }

        let mut regex = String::from("^");
        let mut parts = Vec::new();
        let mut rest = pattern;

        while !rest.is_empty() {
            let token = [
                ("YYYY", DatePart::Year, 4),
                ("%Y", DatePart::Year, 4),
                ("MM", DatePart::Month, 2),
                ("%m", DatePart::Month, 2),
                ("DD", DatePart::Day, 2),
                ("%d", DatePart::Day, 2),
            ]
            .into_iter()
            .find(|(token, _, _)| rest.starts_with(token));

            match token {
                Some((token, part, width)) => {
                    if parts.contains(&part) {
                        return Err(invalid("Year, month and day may each appear only once"));
                    }
                    parts.push(part);
                    regex.push_str(&format!("([0-9]{{{}}})", width));
                    rest = &rest[token.len()..];
                }
                None => {
                    let mut chars = rest.chars();
                    if let Some(literal) = chars.next() {
                        if literal == '%' {
                            return Err(invalid("Only %Y, %m and %d directives are supported"));
                        }
                        regex.push_str(&regex::escape(&literal.to_string()));
                    }
                    rest = chars.as_str();
                }
            }
        }
        regex.push('$');

        if parts.len() != 3 {
            return Err(invalid("Format must contain a year, a month and a day"));
        }

        let shape = Regex::new(&regex).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            pattern: pattern.to_string(),
            shape,
            parts,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl PartialEq for DateFormat {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Parses a hire date against `format`.
///
/// A string with the wrong shape is a [`ErrorKind::FormatMismatch`]; a string with
/// the right shape that names no real day is an [`ErrorKind::InvalidCalendarDate`].
pub fn normalize_date(raw: &str, format: &DateFormat) -> std::result::Result<NaiveDate, Violation> {
    let text = raw.trim();

    let captures = format.shape.captures(text).ok_or_else(|| {
        Violation::new(
            ErrorKind::FormatMismatch,
            format!("Date '{}' does not match expected format {}", text, format.pattern),
        )
    })?;

    let (mut year, mut month, mut day) = (0i32, 0u32, 0u32);
    for (index, part) in format.parts.iter().enumerate() {
        // 形狀已由正規表達式保證為純數字
        let digits = &captures[index + 1];
        match part {
            DatePart::Year => year = digits.parse().unwrap_or_default(),
            DatePart::Month => month = digits.parse().unwrap_or_default(),
            DatePart::Day => day = digits.parse().unwrap_or_default(),
        }
    }

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        Violation::new(
            ErrorKind::InvalidCalendarDate,
            format!("Date '{}' is not a real calendar date", text),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso() -> DateFormat {
        DateFormat::parse("YYYY-MM-DD").unwrap()
    }

    #[test]
    fn test_salary_k_notation() {
        let words = NumberWords::default();
        assert_eq!(normalize_salary("Seventy-K", &words), Ok(70000.0));
        assert_eq!(normalize_salary("70k", &words), Ok(70000.0));
        assert_eq!(normalize_salary("70000", &words), Ok(70000.0));
        assert_eq!(normalize_salary("85K", &words), Ok(85000.0));
        assert_eq!(normalize_salary("ninety k", &words), Ok(90000.0));
        assert_eq!(normalize_salary("72.5k", &words), Ok(72500.0));
    }

    #[test]
    fn test_salary_currency_and_separators() {
        let words = NumberWords::default();
        assert_eq!(normalize_salary("$85,000", &words), Ok(85000.0));
        assert_eq!(normalize_salary("  £1,250.50 ", &words), Ok(1250.5));
        assert_eq!(normalize_salary("85 000", &words), Ok(85000.0));
    }

    #[test]
    fn test_salary_plain_numbers_are_idempotent() {
        let words = NumberWords::default();
        for value in [0.0, 30000.0, 75000.5, 150000.01, 123456.789] {
            assert_eq!(normalize_salary(&value.to_string(), &words), Ok(value));
        }
    }

    #[test]
    fn test_salary_unparsable() {
        let words = NumberWords::default();
        for raw in ["ABC", "", "   ", "k", "hundred-k", "seventy", "NaN", "inf", "Seventy-Five-K", "1e308k", "1e308-K"] {
            let err = normalize_salary(raw, &words).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnparsableSalary, "input {:?}", raw);
        }
    }

    #[test]
    fn test_k_notation_overflow_is_unparsable() {
        let overrides = BTreeMap::from([("zillion".to_string(), 1e306)]);
        let words = NumberWords::with_overrides(&overrides).unwrap();

        let err = normalize_salary("Zillion-K", &words).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnparsableSalary);
        assert_eq!(normalize_salary("2.5k", &words), Ok(2500.0));
    }

    #[test]
    fn test_number_word_overrides() {
        let overrides = BTreeMap::from([("Seventy-Five".to_string(), 75.0)]);
        let words = NumberWords::with_overrides(&overrides).unwrap();
        assert_eq!(normalize_salary("Seventy-Five-K", &words), Ok(75000.0));
        assert_eq!(words.len(), DEFAULT_NUMBER_WORDS.len() + 1);

        let empty = BTreeMap::from([(" ".to_string(), 1.0)]);
        assert!(NumberWords::with_overrides(&empty).is_err());
    }

    #[test]
    fn test_date_format_mismatch_vs_invalid_calendar_date() {
        let mismatch = normalize_date("12/25/2023", &iso()).unwrap_err();
        assert_eq!(mismatch.kind, ErrorKind::FormatMismatch);

        let invalid = normalize_date("2023-02-30", &iso()).unwrap_err();
        assert_eq!(invalid.kind, ErrorKind::InvalidCalendarDate);

        assert_ne!(mismatch.kind, invalid.kind);
    }

    #[test]
    fn test_date_invalid_calendar_values() {
        for raw in ["2023-13-01", "2023-04-31", "2023-01-32", "2023-00-10", "2023-02-29"] {
            assert_eq!(
                normalize_date(raw, &iso()).unwrap_err().kind,
                ErrorKind::InvalidCalendarDate,
                "input {}",
                raw
            );
        }
        assert_eq!(
            normalize_date("2024-02-29", &iso()),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }

    #[test]
    fn test_date_shape_checks() {
        for raw in ["2023-1-05", "2023/01/05", "20230105", "", "2023-01-05T00:00", "２０２３-01-05"] {
            assert_eq!(
                normalize_date(raw, &iso()).unwrap_err().kind,
                ErrorKind::FormatMismatch,
                "input {}",
                raw
            );
        }
    }

    #[test]
    fn test_strftime_and_reordered_formats() {
        let strftime = DateFormat::parse("%Y-%m-%d").unwrap();
        assert_eq!(
            normalize_date("2023-01-15", &strftime),
            Ok(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap())
        );

        let us = DateFormat::parse("MM/DD/YYYY").unwrap();
        assert_eq!(
            normalize_date("12/25/2023", &us),
            Ok(NaiveDate::from_ymd_opt(2023, 12, 25).unwrap())
        );
        assert_eq!(normalize_date("2023-12-25", &us).unwrap_err().kind, ErrorKind::FormatMismatch);
    }

    #[test]
    fn test_invalid_date_formats() {
        assert!(DateFormat::parse("").is_err());
        assert!(DateFormat::parse("YYYY-MM").is_err());
        assert!(DateFormat::parse("YYYY-MM-DD-DD").is_err());
        assert!(DateFormat::parse("%Y-%b-%d").is_err());
    }
}
