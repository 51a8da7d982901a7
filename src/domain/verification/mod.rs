//! Verification domain module.
//!
//! Records tracked on behalf of the identity provider and the notifications
//! emitted when they change.
//!
//! # Module Structure
//!
//! - `status` - Status, result and type enumerations
//! - `verification` - Verification record and its update set
//! - `authentication` - UserAuthentication record and its upsert set
//! - `attempt` - Append-only callback audit trail
//! - `events` - Notifications for the host application
//! - `standing` - Per-user queries over both record kinds

mod attempt;
mod authentication;
mod events;
mod standing;
mod status;
#[allow(clippy::module_inception)]
mod verification;

pub use attempt::{NewVerificationAttempt, VerificationAttempt};
pub use authentication::{
    AuthenticationUpsert, UserAuthentication, FACE_MATCH_THRESHOLD, LIVENESS_THRESHOLD,
};
pub use events::{
    AuthenticationCompleted, VerificationCompleted, VerificationFailed, VerificationNotification,
};
pub use standing::{
    RequiredVerification, UserVerificationStanding, REAUTHENTICATION_HOURS, REVERIFICATION_DAYS,
};
pub use status::{VerificationResult, VerificationStatus, VerificationType};
pub use verification::{NewVerification, Verification, VerificationUpdate};
