//! Axum router configuration for the VerifyNow callback endpoint.

use axum::{routing::post, Router};

use super::handlers::{handle_verifinow_webhook, WebhookAppState};

/// Webhook routes, relative to `/api/webhooks`.
///
/// # Routes
/// - `POST /verifinow` - Handle VerifyNow callbacks (signature verified, no user auth)
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/verifinow", post(handle_verifinow_webhook))
}

/// Complete webhook router with state applied, ready to merge into the app.
///
/// ```ignore
/// let app = Router::new().merge(webhook_router(state));
/// ```
pub fn webhook_router(state: WebhookAppState) -> Router {
    Router::new()
        .nest("/api/webhooks", webhook_routes())
        .with_state(state)
}
