//! Field-level rules shared by every form.
//!
//! Each rule records a failure in `errors` and returns `None`, or returns the
//! parsed value. Empty and whitespace-only input means "not supplied".

use chrono::{NaiveDate, NaiveTime};
use std::str::FromStr;

use super::ValidationErrors;

/// Trimmed text, or `None` when blank.
pub fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trimmed text of at least `min_chars` characters.
pub fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    min_chars: usize,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, "is required");
        return None;
    }
    if trimmed.chars().count() < min_chars {
        errors.push(field, format!("must be at least {} characters", min_chars));
        return None;
    }
    Some(trimmed.to_string())
}

/// A calendar date in `YYYY-MM-DD` form.
pub fn date(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(_) => {
            errors.push(field, format!("'{}' is not a valid date (YYYY-MM-DD)", value.trim()));
            None
        }
    }
}

/// Like [`date`] but blank is allowed.
pub fn optional_date(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<NaiveDate> {
    if value.trim().is_empty() {
        None
    } else {
        date(errors, field, value)
    }
}

/// A wall-clock time, `HH:MM` or `HH:MM:SS`.
pub fn time(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| {
            errors.push(field, format!("'{}' is not a valid time (HH:MM)", trimmed));
        })
        .ok()
}

/// A member of a closed enumeration. Blank gives `None`; anything else must match exactly.
pub fn optional_enum<T>(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<T>
where
    T: FromStr<Err = crate::models::ParseEnumError>,
{
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(field, format!("must be one of: {}", e.expected));
            None
        }
    }
}

/// An integer within `min..=max`. Blank gives `None`.
pub fn optional_int_in_range(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    min: u32,
    max: u32,
) -> Option<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<u32>() {
        Ok(n) if (min..=max).contains(&n) => Some(n),
        _ => {
            errors.push(field, format!("must be a whole number between {} and {}", min, max));
            None
        }
    }
}

/// Check that a present numeric value lies within `min..=max`.
pub fn check_range<T: PartialOrd + std::fmt::Display + Copy>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<T>,
    min: T,
    max: T,
) {
    if let Some(v) = value {
        if v < min || v > max {
            errors.push(field, format!("{} is outside {}..{}", v, min, max));
        }
    }
}

/// A phone number with at least `min_digits` digits.
///
/// Separators (space, `+`, `-`, `(`, `)`, `.`) are allowed and kept; the
/// returned string is the trimmed input, never reformatted.
pub fn optional_phone(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    min_digits: usize,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.')))
    {
        errors.push(field, format!("contains invalid character '{}'", bad));
        return None;
    }
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < min_digits {
        errors.push(field, format!("must contain at least {} digits", min_digits));
        return None;
    }
    Some(trimmed.to_string())
}

/// A plausible email address: `local@domain.tld`.
pub fn optional_email(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !trimmed.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Some(trimmed.to_string())
    } else {
        errors.push(field, format!("'{}' is not a valid email address", trimmed));
        None
    }
}
