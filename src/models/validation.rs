//! Field-level validation errors
//!
//! Input validation collects every offending field instead of stopping at
//! the first. The resulting `ValidationErrors` value maps field names to
//! one or more messages and is surfaced to API clients alongside a 422.

use serde::Serialize;
use std::collections::BTreeMap;

/// Per-field validation failures
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field name to messages mapping
    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// Convert into a `Result`, erroring when any field failed
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Check a string against a maximum length
    pub fn check_max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("must be at most {} characters", max));
        }
    }

    /// Require a non-empty string value with a maximum length
    pub fn require_str(&mut self, field: &str, value: &str, max: usize) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        } else {
            self.check_max_len(field, value, max);
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        for (field, messages) in &self.fields {
            write!(f, "; {}: {}", field, messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_ok() {
        let errors = ValidationErrors::new();
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_collects_multiple_fields() {
        let mut errors = ValidationErrors::new();
        errors.require_str("name", "", 100);
        errors.require_str("color", "", 30);
        let errors = errors.into_result().unwrap_err();
        assert_eq!(errors.fields().len(), 2);
        assert!(errors.fields().contains_key("name"));
        assert!(errors.fields().contains_key("color"));
    }

    #[test]
    fn test_max_len_counts_chars() {
        let mut errors = ValidationErrors::new();
        errors.check_max_len("size", &"é".repeat(10), 10);
        assert!(errors.is_empty());
        errors.check_max_len("size", &"é".repeat(11), 10);
        assert!(!errors.is_empty());
    }
}
