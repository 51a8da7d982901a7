//! Application layer - Command and query handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    CheckVerificationHandler, CheckVerificationQuery, CheckVerificationResult,
    GetUserStandingHandler, GetUserStandingQuery, HandleProviderWebhookCommand,
    HandleProviderWebhookHandler,
};
