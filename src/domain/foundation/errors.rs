//! Error types for the domain layer.
//!
//! `ValidationError` rejects bad input while building values; `DomainError`
//! carries infrastructure failures out of ports.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Input that cannot become a domain value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' has invalid value: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Classifies a [`DomainError`] so callers can react without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    VerificationNotFound,
    VerificationExists,
    DatabaseError,
    EventPublishFailed,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::VerificationNotFound => "VERIFICATION_NOT_FOUND",
            ErrorCode::VerificationExists => "VERIFICATION_EXISTS",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::EventPublishFailed => "EVENT_PUBLISH_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Infrastructure trouble that may clear up on its own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCode::DatabaseError | ErrorCode::EventPublishFailed
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a port implementation.
///
/// `details` holds structured context (table, operation, ids) for logs; it is
/// not part of the display string.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// Shorthand for [`ErrorCode::DatabaseError`].
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(ErrorCode::ValidationFailed, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("verification_id");
        assert_eq!(format!("{}", err), "Field 'verification_id' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("confidence_score", 0.0, 100.0, 150.5);
        assert_eq!(
            format!("{}", err),
            "Field 'confidence_score' must be between 0 and 100, got 150.5"
        );
    }

    #[test]
    fn validation_error_invalid_value_displays_correctly() {
        let err = ValidationError::invalid_value("result", "unknown result 'maybe'");
        assert_eq!(
            format!("{}", err),
            "Field 'result' has invalid value: unknown result 'maybe'"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::VerificationNotFound, "Verification not found");
        assert_eq!(
            format!("{}", err),
            "[VERIFICATION_NOT_FOUND] Verification not found"
        );
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::database("connection refused")
            .with_detail("table", "verifications")
            .with_detail("operation", "update");

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.details.get("table"), Some(&"verifications".to_string()));
        assert_eq!(err.details.get("operation"), Some(&"update".to_string()));
        assert_eq!(err.to_string(), "[DATABASE_ERROR] connection refused");
    }

    #[test]
    fn only_infrastructure_codes_are_transient() {
        assert!(ErrorCode::DatabaseError.is_transient());
        assert!(ErrorCode::EventPublishFailed.is_transient());
        assert!(!ErrorCode::VerificationNotFound.is_transient());
        assert!(!ErrorCode::ValidationFailed.is_transient());
    }

    #[test]
    fn validation_error_converts_to_domain_error() {
        let err: DomainError = ValidationError::empty_field("authentication_id").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("authentication_id"));
    }
}
