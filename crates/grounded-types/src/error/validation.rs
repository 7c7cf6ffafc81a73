//! Request validation errors.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One failed constraint, addressed by a JSON path like `messages[2].content`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Structured validation failure: the first failing constraint plus all of them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable rendering of the first violation
    pub message: String,
    /// Every violation, in document order
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Build from a non-empty violation list. Returns `None` when there is nothing to report.
    pub fn from_violations(violations: Vec<Violation>) -> Option<Self> {
        let first = violations.first()?;
        Some(Self { message: first.to_string(), violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_violation_names_message() {
        let err = ValidationError::from_violations(vec![
            Violation::new("messages[0].role", "must be one of: user, assistant"),
            Violation::new("messages[1].content", "must not be empty"),
        ])
        .expect("non-empty");
        assert_eq!(err.message, "messages[0].role: must be one of: user, assistant");
        assert_eq!(err.violations.len(), 2);
    }

    #[test]
    fn test_empty_violations_is_none() {
        assert!(ValidationError::from_violations(Vec::new()).is_none());
    }
}
