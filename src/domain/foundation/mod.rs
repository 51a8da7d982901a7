//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, event infrastructure and error types
//! used by the verification and webhook modules.

mod errors;
mod events;
mod score;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{schema_version_of, DomainEvent, EventEnvelope, EventId, EventMetadata};
pub use score::Score;
pub use timestamp::Timestamp;
