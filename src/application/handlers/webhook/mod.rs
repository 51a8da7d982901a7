//! Webhook command handlers.

mod handle_provider_webhook;

pub use handle_provider_webhook::{HandleProviderWebhookCommand, HandleProviderWebhookHandler};
