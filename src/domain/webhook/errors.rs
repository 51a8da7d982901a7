//! Webhook error types for provider callback handling.
//!
//! Defines the conditions under which a callback is refused or fails, with
//! HTTP status code mapping and retryability semantics.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ValidationError};

/// Why a callback failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureRejection {
    /// Signature or timestamp header absent or empty.
    #[error("Missing webhook signature or timestamp")]
    MissingCredentials,

    /// Timestamp header is not a decimal Unix time.
    #[error("Invalid webhook timestamp")]
    MalformedTimestamp,

    /// Timestamp is further from now than the replay window allows.
    #[error("Webhook timestamp outside acceptable window")]
    StaleTimestamp,

    /// Signature does not match the body.
    #[error("Invalid webhook signature")]
    SignatureMismatch,
}

impl SignatureRejection {
    /// Short machine-readable code for audit logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureRejection::MissingCredentials => "missing_credentials",
            SignatureRejection::MalformedTimestamp => "malformed_timestamp",
            SignatureRejection::StaleTimestamp => "stale_timestamp",
            SignatureRejection::SignatureMismatch => "signature_mismatch",
        }
    }
}

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Authentication failed.
    #[error(transparent)]
    Rejected(#[from] SignatureRejection),

    /// Body is not valid JSON.
    #[error("Malformed body: {0}")]
    MalformedBody(String),

    /// A field is present but holds a value outside its domain.
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] ValidationError),

    /// Record store operation failed.
    #[error("Store error: {0}")]
    Store(DomainError),

    /// Notification could not be handed to the publisher.
    #[error("Publish error: {0}")]
    Publish(DomainError),
}

impl WebhookError {
    /// Returns true if the provider should redeliver this webhook.
    ///
    /// Only transient infrastructure failures are worth retrying; a bad
    /// signature or a bad payload fails identically every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            WebhookError::Store(e) | WebhookError::Publish(e) => e.code.is_transient(),
            _ => false,
        }
    }

    /// Maps the error to an HTTP status code.
    ///
    /// - 401: authentication failure
    /// - 500: everything else
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Rejected(_) => StatusCode::UNAUTHORIZED,
            WebhookError::MalformedBody(_)
            | WebhookError::InvalidPayload(_)
            | WebhookError::Store(_)
            | WebhookError::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
