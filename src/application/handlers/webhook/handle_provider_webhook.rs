//! HandleProviderWebhookHandler - Command handler for VerifyNow callbacks.
//!
//! Runs the full callback pipeline:
//! 1. Verify signature and replay window
//! 2. Parse the body into a typed event
//! 3. Dispatch the event to the record store
//! 4. Publish the resulting notification
//! 5. Record an attempt against the verification the callback names
//!
//! Step 5 also runs when steps 2-4 fail, so a callback that answered 500 still
//! leaves a failed attempt behind.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::domain::foundation::{ErrorCode, Timestamp};
use crate::domain::verification::{NewVerificationAttempt, VerificationStatus};
use crate::domain::webhook::{
    audited_verification_id, DispatchOutcome, RecordKind, WebhookDispatcher, WebhookError,
    WebhookEvent, WebhookSignatureVerifier,
};
use crate::ports::{EventPublisher, VerificationStore};

/// Command to handle one provider callback.
#[derive(Debug, Clone, Default)]
pub struct HandleProviderWebhookCommand {
    /// `X-Webhook-Signature` header.
    pub signature: Option<String>,
    /// `X-Webhook-Timestamp` header.
    pub timestamp: Option<String>,
    /// Raw body exactly as received.
    pub payload: Vec<u8>,
    /// Caller address, recorded on attempts.
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Handler for provider webhooks.
pub struct HandleProviderWebhookHandler {
    verifier: Arc<WebhookSignatureVerifier>,
    dispatcher: WebhookDispatcher,
    store: Arc<dyn VerificationStore>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl HandleProviderWebhookHandler {
    pub fn new(
        verifier: Arc<WebhookSignatureVerifier>,
        store: Arc<dyn VerificationStore>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            verifier,
            dispatcher: WebhookDispatcher::new(store.clone()),
            store,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleProviderWebhookCommand,
    ) -> Result<DispatchOutcome, WebhookError> {
        self.handle_at(cmd, Timestamp::now()).await
    }

    /// Same as [`handle`](Self::handle) with an explicit clock.
    pub async fn handle_at(
        &self,
        cmd: HandleProviderWebhookCommand,
        now: Timestamp,
    ) -> Result<DispatchOutcome, WebhookError> {
        // 1. Authenticate
        self.verifier.verify(
            cmd.signature.as_deref(),
            cmd.timestamp.as_deref(),
            &cmd.payload,
            now,
        )?;

        let body: JsonValue = serde_json::from_slice(&cmd.payload)
            .map_err(|e| WebhookError::MalformedBody(e.to_string()))?;

        let processed = self.process(&body, cmd.ip_address.as_deref(), now).await;
        match processed {
            Ok(outcome) => {
                if let DispatchOutcome::Applied {
                    kind: RecordKind::Verification,
                    external_id,
                    status,
                    ..
                } = &outcome
                {
                    let attempt = AttemptDraft::new(external_id.clone(), *status, Some(200));
                    self.record_attempt(attempt.build(body, &cmd)).await?;
                }
                Ok(outcome)
            }
            Err(err) => {
                if let Some(verification_id) = audited_verification_id(&body) {
                    let mut attempt =
                        AttemptDraft::new(verification_id, VerificationStatus::Failed, Some(500));
                    attempt.error_message = Some(err.to_string());
                    if let Err(e) = self.record_attempt(attempt.build(body, &cmd)).await {
                        tracing::warn!(error = %e, "failed to record failed webhook attempt");
                    }
                }
                Err(err)
            }
        }
    }

    /// Steps 2-4. Never writes an attempt.
    async fn process(
        &self,
        body: &JsonValue,
        ip: Option<&str>,
        now: Timestamp,
    ) -> Result<DispatchOutcome, WebhookError> {
        // 2. Parse
        let event = WebhookEvent::from_json(body)?;

        tracing::info!(
            event_type = event.event_type().unwrap_or("<none>"),
            ip = ip,
            "VerifyNow webhook received"
        );

        // 3. Dispatch
        let outcome = self.dispatcher.dispatch(&event, now).await?;

        if let DispatchOutcome::Ignored(reason) = &outcome {
            tracing::info!(reason = %reason, "VerifyNow webhook ignored");
            return Ok(outcome);
        }

        // 4. Notify
        if let Some(notification) = outcome.notification() {
            self.event_publisher
                .publish(notification.to_envelope())
                .await
                .map_err(WebhookError::Publish)?;
        }

        Ok(outcome)
    }

    /// Appends to the audit trail. A verification missing from the store
    /// (unknown id, or deleted mid-request) has no trail to append to.
    async fn record_attempt(&self, attempt: NewVerificationAttempt) -> Result<(), WebhookError> {
        let verification_id = attempt.verification_id.clone();
        match self.store.record_attempt(attempt).await {
            Ok(recorded) => {
                tracing::debug!(
                    verification_id = %recorded.verification_id,
                    attempt_number = recorded.attempt_number,
                    response_code = recorded.response_code,
                    "verification attempt recorded"
                );
                Ok(())
            }
            Err(e) if e.code == ErrorCode::VerificationNotFound => {
                tracing::warn!(
                    verification_id = %verification_id,
                    "no stored verification to record attempt against"
                );
                Ok(())
            }
            Err(e) => Err(WebhookError::Store(e)),
        }
    }
}

struct AttemptDraft {
    verification_id: String,
    status: VerificationStatus,
    response_code: Option<i32>,
    error_message: Option<String>,
}

impl AttemptDraft {
    fn new(verification_id: String, status: VerificationStatus, response_code: Option<i32>) -> Self {
        Self {
            verification_id,
            status,
            response_code,
            error_message: None,
        }
    }

    fn build(self, body: JsonValue, cmd: &HandleProviderWebhookCommand) -> NewVerificationAttempt {
        NewVerificationAttempt {
            verification_id: self.verification_id,
            status: self.status,
            response_code: self.response_code,
            error_message: self.error_message,
            response_data: body,
            ip_address: cmd.ip_address.clone(),
            user_agent: cmd.user_agent.clone(),
        }
    }
}
