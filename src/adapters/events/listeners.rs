//! Logging listeners for verification notifications.
//!
//! Subscribed by the binary so every terminal verification leaves an
//! operator-visible log line even when the host application has no handler.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::domain::verification::{VerificationCompleted, VerificationFailed};
use crate::ports::EventHandler;

/// Event type handled by [`LogVerificationCompleted`].
pub const VERIFICATION_COMPLETED_V1: &str = "verification.completed.v1";

/// Event type handled by [`LogVerificationFailed`].
pub const VERIFICATION_FAILED_V1: &str = "verification.failed.v1";

/// Logs completed verifications at info level.
pub struct LogVerificationCompleted;

#[async_trait]
impl EventHandler for LogVerificationCompleted {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let completed: VerificationCompleted = event.payload_as().map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Undecodable {} payload: {}", event.event_type, e),
            )
        })?;

        tracing::info!(
            verification_id = %completed.verification_id,
            user_id = ?completed.verification.user_id,
            result = %completed.verification.result,
            confidence_score = completed.verification.confidence_score.value(),
            "Verification completed"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogVerificationCompleted"
    }
}

/// Logs failed verifications at warn level with the provider's reason.
pub struct LogVerificationFailed;

#[async_trait]
impl EventHandler for LogVerificationFailed {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let failed: VerificationFailed = event.payload_as().map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Undecodable {} payload: {}", event.event_type, e),
            )
        })?;

        tracing::warn!(
            verification_id = %failed.verification_id,
            user_id = ?failed.verification.user_id,
            reason = ?failed.verification.failure_reason(),
            "Verification failed"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogVerificationFailed"
    }
}
