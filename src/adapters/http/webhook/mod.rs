//! HTTP adapter for provider callbacks.
//!
//! - `POST /api/webhooks/verifinow` - Handle VerifyNow webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{WebhookAckResponse, WebhookErrorResponse};
pub use handlers::{
    handle_verifinow_webhook, WebhookApiError, WebhookAppState, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
pub use routes::{webhook_router, webhook_routes};
