//! Per-user verification query handlers.

mod check_verification;
mod get_user_standing;

pub use check_verification::{
    CheckVerificationHandler, CheckVerificationQuery, CheckVerificationResult,
};
pub use get_user_standing::{GetUserStandingHandler, GetUserStandingQuery};
