//! Webhook dispatcher - Applies a verified event to the record store.
//!
//! Each event kind maps to exactly one typed store operation. The dispatcher
//! never publishes; the notification it builds is returned in the outcome and
//! forwarded by the caller.
//!
//! ## Outcomes
//!
//! - `Applied` - a record was written
//! - `Ignored` - nothing was written (unknown type, missing id, unknown record)
//!
//! Ignored outcomes are acknowledged to the provider as success.

use serde_json::{json, Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

use crate::domain::foundation::{Score, Timestamp};
use crate::domain::verification::{
    AuthenticationUpsert, Verification, VerificationNotification, VerificationResult,
    VerificationStatus, VerificationUpdate,
};
use crate::ports::VerificationStore;

use super::errors::WebhookError;
use super::event::{
    AuthenticationCompletedPayload, AuthenticationFailedPayload, VerificationCompletedPayload,
    VerificationFailedPayload, WebhookEvent,
};

/// Which table an applied event wrote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Verification,
    UserAuthentication,
}

/// Why an event was acknowledged without writing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownType,
    MissingId,
    NotFound,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::UnknownType => "unknown_type",
            IgnoreReason::MissingId => "missing_id",
            IgnoreReason::NotFound => "not_found",
        }
    }
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of dispatching one event.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Applied {
        kind: RecordKind,
        /// External id of the written record.
        external_id: String,
        /// Status written to the record.
        status: VerificationStatus,
        notification: Option<VerificationNotification>,
    },
    Ignored(IgnoreReason),
}

impl DispatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied { .. })
    }

    pub fn notification(&self) -> Option<&VerificationNotification> {
        match self {
            DispatchOutcome::Applied { notification, .. } => notification.as_ref(),
            DispatchOutcome::Ignored(_) => None,
        }
    }
}

/// Routes verified events to store operations.
#[derive(Clone)]
pub struct WebhookDispatcher {
    store: Arc<dyn VerificationStore>,
}

impl WebhookDispatcher {
    pub fn new(store: Arc<dyn VerificationStore>) -> Self {
        Self { store }
    }

    /// Applies `event` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Store` when the store fails. Business outcomes
    /// (unknown ids, rejected subjects) are never errors.
    pub async fn dispatch(
        &self,
        event: &WebhookEvent,
        now: Timestamp,
    ) -> Result<DispatchOutcome, WebhookError> {
        match event {
            WebhookEvent::VerificationCompleted(p) => self.verification_completed(p, now).await,
            WebhookEvent::VerificationFailed(p) => self.verification_failed(p, now).await,
            WebhookEvent::AuthenticationCompleted(p) => {
                self.authentication_completed(p, now).await
            }
            WebhookEvent::AuthenticationFailed(p) => self.authentication_failed(p, now).await,
            WebhookEvent::Unknown { event_type } => {
                tracing::warn!(
                    event_type = event_type.as_deref().unwrap_or("<none>"),
                    "unknown webhook event type"
                );
                Ok(DispatchOutcome::Ignored(IgnoreReason::UnknownType))
            }
        }
    }

    async fn verification_completed(
        &self,
        payload: &VerificationCompletedPayload,
        now: Timestamp,
    ) -> Result<DispatchOutcome, WebhookError> {
        let Some(id) = payload.verification_id.as_deref() else {
            return Ok(missing_id("verification.completed"));
        };

        let update = VerificationUpdate {
            status: Some(VerificationStatus::Completed),
            result: Some(payload.result.unwrap_or_default()),
            confidence_score: Some(payload.confidence_score.unwrap_or_default()),
            metadata: None,
            completed_at: Some(now),
        };

        let Some(updated) = self.update_existing(id, update).await? else {
            return Ok(not_found(id));
        };

        tracing::info!(
            verification_id = %id,
            result = %updated.result,
            confidence_score = updated.confidence_score.value(),
            "verification completed"
        );

        Ok(DispatchOutcome::Applied {
            kind: RecordKind::Verification,
            external_id: id.to_string(),
            status: VerificationStatus::Completed,
            notification: Some(VerificationNotification::verification_completed(updated, now)),
        })
    }

    async fn verification_failed(
        &self,
        payload: &VerificationFailedPayload,
        now: Timestamp,
    ) -> Result<DispatchOutcome, WebhookError> {
        let Some(id) = payload.verification_id.as_deref() else {
            return Ok(missing_id("verification.failed"));
        };

        let update = VerificationUpdate {
            status: Some(VerificationStatus::Failed),
            result: Some(VerificationResult::Rejected),
            metadata: Some(failure_reason(payload.reason.as_ref())),
            ..Default::default()
        };

        let Some(updated) = self.update_existing(id, update).await? else {
            return Ok(not_found(id));
        };

        tracing::warn!(
            verification_id = %id,
            reason = ?updated.failure_reason(),
            "verification failed"
        );

        Ok(DispatchOutcome::Applied {
            kind: RecordKind::Verification,
            external_id: id.to_string(),
            status: VerificationStatus::Failed,
            notification: Some(VerificationNotification::verification_failed(updated, now)),
        })
    }

    async fn authentication_completed(
        &self,
        payload: &AuthenticationCompletedPayload,
        now: Timestamp,
    ) -> Result<DispatchOutcome, WebhookError> {
        let Some(id) = payload.authentication_id.as_deref() else {
            return Ok(missing_id("authentication.completed"));
        };

        let upsert = AuthenticationUpsert {
            verification_id: Some(payload.verification_id.clone()),
            status: Some(VerificationStatus::Completed),
            result: Some(payload.result.unwrap_or_default()),
            confidence_score: Some(payload.confidence_score.unwrap_or(Score::ZERO)),
            liveness_score: Some(payload.liveness_score.unwrap_or(Score::ZERO)),
            face_match_score: Some(payload.face_match_score.unwrap_or(Score::ZERO)),
            authenticated_at: Some(now),
            ..Default::default()
        };

        let authentication = self
            .store
            .upsert_authentication_by_external_id(id, upsert)
            .await
            .map_err(WebhookError::Store)?;

        tracing::info!(
            authentication_id = %id,
            result = %authentication.result,
            liveness_detected = authentication.liveness_detected(),
            face_matches = authentication.face_matches(),
            "authentication completed"
        );

        Ok(DispatchOutcome::Applied {
            kind: RecordKind::UserAuthentication,
            external_id: id.to_string(),
            status: VerificationStatus::Completed,
            notification: Some(VerificationNotification::authentication_completed(
                authentication,
                now,
            )),
        })
    }

    async fn authentication_failed(
        &self,
        payload: &AuthenticationFailedPayload,
        _now: Timestamp,
    ) -> Result<DispatchOutcome, WebhookError> {
        let Some(id) = payload.authentication_id.as_deref() else {
            return Ok(missing_id("authentication.failed"));
        };

        let upsert = AuthenticationUpsert {
            status: Some(VerificationStatus::Failed),
            result: Some(VerificationResult::Rejected),
            device_info: Some(failure_reason(payload.reason.as_ref())),
            ..Default::default()
        };

        self.store
            .upsert_authentication_by_external_id(id, upsert)
            .await
            .map_err(WebhookError::Store)?;

        tracing::warn!(authentication_id = %id, reason = ?payload.reason, "authentication failed");

        Ok(DispatchOutcome::Applied {
            kind: RecordKind::UserAuthentication,
            external_id: id.to_string(),
            status: VerificationStatus::Failed,
            notification: None,
        })
    }

    /// Looks the verification up first so unknown ids never reach the writer.
    async fn update_existing(
        &self,
        id: &str,
        update: VerificationUpdate,
    ) -> Result<Option<Verification>, WebhookError> {
        let existing = self
            .store
            .find_verification_by_external_id(id)
            .await
            .map_err(WebhookError::Store)?;

        if existing.is_none() {
            return Ok(None);
        }

        self.store
            .update_verification(id, update)
            .await
            .map_err(WebhookError::Store)
    }
}

fn failure_reason(reason: Option<&JsonValue>) -> Map<String, JsonValue> {
    let mut map = Map::new();
    map.insert(
        "failure_reason".to_string(),
        reason.cloned().unwrap_or_else(|| json!("unknown")),
    );
    map
}

fn missing_id(event_type: &'static str) -> DispatchOutcome {
    tracing::warn!(event_type, "webhook event missing record id");
    DispatchOutcome::Ignored(IgnoreReason::MissingId)
}

fn not_found(id: &str) -> DispatchOutcome {
    tracing::warn!(external_id = %id, "webhook event for unknown record");
    DispatchOutcome::Ignored(IgnoreReason::NotFound)
}
