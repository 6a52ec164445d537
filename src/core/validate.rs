//! Field validators. Each returns the value's canonical form on success.

use crate::core::normalize::Violation;
use crate::core::rules::{IdRule, PhoneRule, SalaryBounds};
use crate::domain::model::{Bound, ErrorKind};

type Checked<T> = std::result::Result<T, Violation>;

const PHONE_SEPARATORS: [char; 6] = [' ', '-', '.', '(', ')', '+'];

pub fn validate_id(raw: &str, rule: &IdRule) -> Checked<String> {
    let id = raw.trim();
    let fail = |message: String| Err(Violation::new(ErrorKind::IdFormatError, message));

    if id.is_empty() {
        return fail("Employee ID is empty".to_string());
    }
    if let Some(length) = rule.required_length {
        let actual = id.chars().count();
        if actual != length {
            return fail(format!("ID '{}' must be {} chars, found {}", id, length, actual));
        }
    }
    if let Some(prefix) = &rule.prefix {
        if !id.starts_with(prefix.as_str()) {
            return fail(format!("ID '{}' must start with '{}'", id, prefix));
        }
    }
    if let Some(pattern) = &rule.pattern {
        if !pattern.is_match(id) {
            return fail(format!("ID '{}' does not match pattern {}", id, pattern.as_str()));
        }
    }

    Ok(id.to_string())
}

/// Structural check only: one `@`, non-empty local part, dotted domain.
pub fn validate_email(raw: &str) -> Checked<String> {
    let email = raw.trim();
    let fail = |reason: &str| {
        Err(Violation::new(
            ErrorKind::EmailFormatError,
            format!("Email '{}' {}", email, reason),
        ))
    };

    if email.matches('@').count() != 1 {
        return fail("must contain exactly one '@'");
    }
    let Some((local, domain)) = email.split_once('@') else {
        return fail("must contain exactly one '@'");
    };
    if local.is_empty() {
        return fail("has an empty local part");
    }
    if domain.is_empty() {
        return fail("has an empty domain");
    }
    if !domain.contains('.') {
        return fail("domain must contain a dot");
    }

    Ok(format!("{}@{}", local, domain.to_lowercase()))
}

/// Counts digits, ignoring common separators; the count must match exactly.
pub fn validate_phone(raw: &str, rule: &PhoneRule) -> Checked<String> {
    let phone = raw.trim();

    if let Some(bad) = phone
        .chars()
        .find(|c| !c.is_ascii_digit() && !PHONE_SEPARATORS.contains(c))
    {
        return Err(Violation::new(
            ErrorKind::PhoneLengthError,
            format!("Phone '{}' contains invalid character '{}'", phone, bad),
        ));
    }

    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != rule.required_digit_count {
        return Err(Violation::new(
            ErrorKind::PhoneLengthError,
            format!(
                "Phone '{}' must have exactly {} digits, found {}",
                phone,
                rule.required_digit_count,
                digits.len()
            ),
        ));
    }

    Ok(digits)
}

/// Inclusive on both ends; the violated bound is reported.
pub fn validate_salary_bounds(value: f64, bounds: &SalaryBounds) -> Checked<f64> {
    if value < bounds.min {
        return Err(Violation::new(
            ErrorKind::SalaryBoundsError {
                violated_bound: Bound::Min,
            },
            format!("Salary {} is below the minimum of {}", value, bounds.min),
        ));
    }
    if value > bounds.max {
        return Err(Violation::new(
            ErrorKind::SalaryBoundsError {
                violated_bound: Bound::Max,
            },
            format!("Salary {} exceeds the maximum of {}", value, bounds.max),
        ));
    }
    Ok(value)
}
