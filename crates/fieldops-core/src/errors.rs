//! Core error types.

use thiserror::Error;

/// Errors from core domain parsing and validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A string field held a value outside the closed set.
    #[error("unknown {field} value: {value}")]
    UnknownValue {
        /// Which field was being parsed.
        field: &'static str,
        /// The offending value.
        value: String,
    },

    /// A date string was not `YYYY-MM-DD`.
    #[error("invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// A timestamp string was not ISO-8601.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl CoreError {
    /// Build an [`CoreError::UnknownValue`].
    pub fn unknown_value(field: &'static str, value: &str) -> Self {
        Self::UnknownValue {
            field,
            value: value.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_value_display() {
        let err = CoreError::unknown_value("status", "done");
        assert_eq!(err.to_string(), "unknown status value: done");
    }

    #[test]
    fn invalid_date_display() {
        let err = CoreError::InvalidDate("2024-13-01".to_string());
        assert!(err.to_string().contains("2024-13-01"));
    }
}
