use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[0-9 ()./-]{7,20}$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// One or more field-level problems with an input payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("validation failed: {}", join(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn join(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Collects field errors, then finishes into a single result.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
        self
    }

    pub fn required(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if value.map(str::trim).unwrap_or_default().is_empty() {
            self.error(field, "is required");
        }
        self
    }

    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) -> &mut Self {
        let lower = value.trim().to_ascii_lowercase();
        if !allowed.contains(&lower.as_str()) {
            self.error(field, format!("must be one of: {}", allowed.join(", ")));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Seven to fifteen digits, optionally with a leading '+' and common separators.
pub fn is_valid_phone(value: &str) -> bool {
    let value = value.trim();
    let digits = value.chars().filter(char::is_ascii_digit).count();
    PHONE_RE.is_match(value) && (7..=15).contains(&digits)
}

pub fn is_valid_url(value: &str) -> bool {
    match url::Url::parse(value.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_field_error() {
        let err = Validator::new()
            .required("mode", None)
            .one_of("tool", "zoominfo", &["apollo"])
            .error("limit", "must be positive")
            .finish()
            .unwrap_err();
        let fields: Vec<_> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["mode", "tool", "limit"]);
        assert!(err.to_string().starts_with("validation failed: mode: is required"));
    }

    #[test]
    fn valid_input_passes() {
        Validator::new()
            .required("mode", Some("live"))
            .one_of("mode", "LIVE", &["test", "live"])
            .finish()
            .unwrap();
    }

    #[test]
    fn contact_formats() {
        assert!(is_valid_email(" jane@acme.io "));
        assert!(!is_valid_email("nope"));
        assert!(!is_valid_email("jane@acme"));
        assert!(is_valid_url("https://hooks.slack.com/services/T/B/X"));
        assert!(!is_valid_url("ftp://x"));
    }

    #[test]
    fn one_of_lists_allowed_values() {
        let err = Validator::new()
            .one_of("tool", "linkedin", &["apollo", "apify"])
            .finish()
            .unwrap_err();
        assert_eq!(err.errors[0].message, "must be one of: apollo, apify");
    }

    #[test]
    fn phone_digit_bounds() {
        assert!(is_valid_phone("612-555-0100"));
        assert!(!is_valid_phone("555-01"));
        assert!(!is_valid_phone("+1 612 555 0100 0100 01"));
        assert!(!is_valid_phone("call me"));
    }
}
