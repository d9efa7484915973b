//! Form validation shared by every create/update workflow.
//!
//! Validators return `ValidationError` values tagged with the offending
//! field so front ends can place the message next to the input.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// Highest jersey number accepted on a roster.
pub const MAX_JERSEY_NUMBER: u8 = 99;

/// Maximum length for free-text names (teams, tryouts, camps, people).
pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collected errors for a whole form.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error of a single check, if any
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.0.push(e);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ok when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

pub fn max_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

/// Required name with the standard length cap
pub fn name(field: &str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    max_length(field, value.trim(), MAX_NAME_LENGTH)
}

/// Loose structural email check: one `@`, non-empty local part, and a
/// dotted domain without whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty())
        && labels.last().map(|tld| tld.len() >= 2).unwrap_or(false)
}

pub fn email(field: &str, value: &str) -> Result<(), ValidationError> {
    if !is_valid_email(value) {
        return Err(ValidationError::new(field, "must be a valid email address"));
    }
    Ok(())
}

/// Validate an optional email; blank counts as absent
pub fn optional_email(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => email(field, v),
        None => Ok(()),
    }
}

/// Phone numbers must carry 10 digits, or 11 with a leading country code 1
pub fn phone(field: &str, value: &str) -> Result<(), ValidationError> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => Ok(()),
        11 if digits.starts_with('1') => Ok(()),
        _ => Err(ValidationError::new(field, "must be a 10-digit phone number")),
    }
}

pub fn optional_phone(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => phone(field, v),
        None => Ok(()),
    }
}

pub fn jersey_number(field: &str, value: i32) -> Result<(), ValidationError> {
    if !(0..=MAX_JERSEY_NUMBER as i32).contains(&value) {
        return Err(ValidationError::new(
            field,
            format!("must be between 0 and {}", MAX_JERSEY_NUMBER),
        ));
    }
    Ok(())
}

pub fn date_range(
    field: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    if let Some(end) = end {
        if end < start {
            return Err(ValidationError::new(field, "must not be before the start date"));
        }
    }
    Ok(())
}

pub fn positive(field: &str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("coach@rinkside.app"));
        assert!(is_valid_email("  parent.name+hockey@mail.example.org "));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("@missing-local.com"));
        assert!(!is_valid_email("two@@signs.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("user@domain.c"));
        assert!(!is_valid_email("user name@domain.com"));
        assert!(!is_valid_email("user@domain..com"));
    }

    #[test]
    fn test_jersey_number_range() {
        assert!(jersey_number("jersey_number", 0).is_ok());
        assert!(jersey_number("jersey_number", 99).is_ok());
        assert!(jersey_number("jersey_number", 100).is_err());
        assert!(jersey_number("jersey_number", -1).is_err());
    }

    #[test]
    fn test_phone_validation() {
        assert!(phone("phone", "(555) 123-4567").is_ok());
        assert!(phone("phone", "1-555-123-4567").is_ok());
        assert!(phone("phone", "555-1234").is_err());
        assert!(optional_phone("phone", Some("  ")).is_ok());
        assert!(optional_phone("phone", None).is_ok());
    }

    #[test]
    fn test_date_range() {
        let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let before = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
        assert!(date_range("end_date", start, Some(start)).is_ok());
        assert!(date_range("end_date", start, None).is_ok());
        assert!(date_range("end_date", start, Some(before)).is_err());
    }

    #[test]
    fn test_collected_errors() {
        let mut errors = ValidationErrors::new();
        errors.check(require("name", "   "));
        errors.check(email("email", "coach@rinkside.app"));
        errors.check(jersey_number("jersey_number", 120));

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.0.len(), 2);
        assert_eq!(err.0[0].field, "name");
        assert_eq!(
            err.to_string(),
            "name: is required; jersey_number: must be between 0 and 99"
        );
    }

    #[test]
    fn test_name_length() {
        assert!(name("name", "Junior Oilers").is_ok());
        assert!(name("name", &"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }
}
