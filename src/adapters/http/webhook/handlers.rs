//! HTTP handler for VerifyNow callbacks.
//!
//! Connects the axum route to [`HandleProviderWebhookHandler`]. The body is
//! taken as raw bytes so the signature is checked over exactly what was sent.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::webhook::{
    HandleProviderWebhookCommand, HandleProviderWebhookHandler,
};
use crate::domain::webhook::{WebhookError, WebhookSignatureVerifier};
use crate::ports::{EventPublisher, VerificationStore};

use super::dto::{WebhookAckResponse, WebhookErrorResponse};

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";
const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Dependencies shared by the webhook route.
#[derive(Clone)]
pub struct WebhookAppState {
    pub verifier: Arc<WebhookSignatureVerifier>,
    pub verification_store: Arc<dyn VerificationStore>,
    pub event_publisher: Arc<dyn EventPublisher>,
}

impl WebhookAppState {
    pub fn webhook_handler(&self) -> HandleProviderWebhookHandler {
        HandleProviderWebhookHandler::new(
            self.verifier.clone(),
            self.verification_store.clone(),
            self.event_publisher.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/verifinow - Handle VerifyNow callbacks
pub async fn handle_verifinow_webhook(
    State(state): State<WebhookAppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let ip_address = forwarded_for(&headers)
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()));

    let cmd = HandleProviderWebhookCommand {
        signature: header_str(&headers, SIGNATURE_HEADER),
        timestamp: header_str(&headers, TIMESTAMP_HEADER),
        payload: body.to_vec(),
        ip_address,
        user_agent: header_str(&headers, http::header::USER_AGENT.as_str()),
    };

    state.webhook_handler().handle(cmd).await?;

    Ok((StatusCode::OK, Json(WebhookAckResponse::processed())))
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// First hop of `X-Forwarded-For`, the original client.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        let body = match &self.0 {
            WebhookError::Rejected(rejection) => {
                WebhookErrorResponse::rejected(rejection.to_string())
            }
            other => {
                tracing::error!(
                    error = %other,
                    retryable = other.is_retryable(),
                    "VerifyNow webhook processing failed"
                );
                WebhookErrorResponse::processing_failed(other.to_string())
            }
        };
        (status, Json(body)).into_response()
    }
}
