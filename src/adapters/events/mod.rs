//! Event bus adapters.
//!
//! - `InProcessEventBus` - Delivers notifications to in-process handlers
//! - `LogVerificationCompleted` / `LogVerificationFailed` - Logging listeners

mod in_process;
mod listeners;

pub use in_process::{InProcessEventBus, DEFAULT_HISTORY_LIMIT};
pub use listeners::{
    LogVerificationCompleted, LogVerificationFailed, VERIFICATION_COMPLETED_V1,
    VERIFICATION_FAILED_V1,
};
