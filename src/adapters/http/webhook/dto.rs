//! Response bodies for the VerifyNow callback endpoint.
//!
//! The provider only inspects the status code; the bodies exist for
//! operators reading delivery logs on the provider dashboard.

use serde::Serialize;

/// Body returned for every callback that reached the dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub message: String,
}

impl WebhookAckResponse {
    pub const PROCESSED: &'static str = "Webhook processed successfully";

    pub fn processed() -> Self {
        Self {
            message: Self::PROCESSED.to_string(),
        }
    }
}

/// Body returned for rejected or failed callbacks.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookErrorResponse {
    /// Human-readable summary.
    pub message: String,
    /// Underlying cause, only present on processing failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookErrorResponse {
    pub const PROCESSING_FAILED: &'static str = "Webhook processing failed";

    /// 401 body: the rejection message alone.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    /// 500 body: generic message plus the cause.
    pub fn processing_failed(error: impl Into<String>) -> Self {
        Self {
            message: Self::PROCESSING_FAILED.to_string(),
            error: Some(error.into()),
        }
    }
}
