//! Webhook domain module.
//!
//! Authenticates provider callbacks and applies them to stored records.
//!
//! # Module Structure
//!
//! - `signature_verifier` - HMAC signature and replay window checks
//! - `errors` - Rejection reasons and processing errors
//! - `event` - Typed event parsed from the callback body
//! - `dispatcher` - Maps events onto record store operations

mod dispatcher;
mod errors;
mod event;
mod signature_verifier;

pub use dispatcher::{DispatchOutcome, IgnoreReason, RecordKind, WebhookDispatcher};
pub use errors::{SignatureRejection, WebhookError};
pub use event::{
    audited_verification_id, event_types, AuthenticationCompletedPayload, AuthenticationFailedPayload,
    VerificationCompletedPayload, VerificationFailedPayload, WebhookEvent,
};
pub use signature_verifier::{WebhookSignatureVerifier, DEFAULT_REPLAY_WINDOW_SECS};
