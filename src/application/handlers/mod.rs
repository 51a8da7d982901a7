//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations across ports.

pub mod standing;
pub mod webhook;

pub use standing::{
    CheckVerificationHandler, CheckVerificationQuery, CheckVerificationResult,
    GetUserStandingHandler, GetUserStandingQuery,
};
pub use webhook::{HandleProviderWebhookCommand, HandleProviderWebhookHandler};
