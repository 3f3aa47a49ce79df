//! Form validation.
//!
//! Forms arrive as strings, the way a front end collects them. Validators
//! collect every failing field into [`ValidationErrors`] instead of stopping
//! at the first one, so the caller can highlight each offending input.

mod appointment;
mod patient;
pub mod rules;

pub use appointment::*;
pub use patient::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Form field name, e.g. `full_name`
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

/// All field errors from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{}", self.summary())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First error reported for `field`.
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field(field).is_some()
    }

    /// `field: message` pairs joined with `; `.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Limits that vary by deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationRules {
    pub min_phone_digits: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self { min_phone_digits: 9 }
    }
}

impl From<&crate::config::ServiceConfig> for ValidationRules {
    fn from(config: &crate::config::ServiceConfig) -> Self {
        Self {
            min_phone_digits: config.min_phone_digits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_and_displays() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().finish(()).is_ok());

        errors.push("full_name", "too short");
        errors.push("phone", "too few digits");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.field("phone").unwrap().message, "too few digits");
        assert_eq!(errors.to_string(), "full_name: too short; phone: too few digits");
        assert!(errors.finish(()).is_err());
    }
}
