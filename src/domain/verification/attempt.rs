//! Append-only audit trail of provider callbacks per verification.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::Timestamp;

use super::VerificationStatus;

/// One recorded callback for a verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationAttempt {
    pub verification_id: String,

    /// 1-based ordinal within the verification.
    pub attempt_number: i32,

    pub status: VerificationStatus,

    pub response_code: Option<i32>,

    pub error_message: Option<String>,

    /// Raw payload snapshot as received.
    pub response_data: JsonValue,

    pub ip_address: Option<String>,

    pub user_agent: Option<String>,

    pub created_at: Timestamp,
}

/// An attempt before the store assigns its number.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVerificationAttempt {
    pub verification_id: String,
    pub status: VerificationStatus,
    pub response_code: Option<i32>,
    pub error_message: Option<String>,
    pub response_data: JsonValue,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewVerificationAttempt {
    /// Numbers the attempt and stamps its creation time.
    pub fn into_attempt(self, attempt_number: i32, now: Timestamp) -> VerificationAttempt {
        VerificationAttempt {
            verification_id: self.verification_id,
            attempt_number,
            status: self.status,
            response_code: self.response_code,
            error_message: self.error_message,
            response_data: self.response_data,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: now,
        }
    }
}

impl VerificationAttempt {
    /// Completed with a 200 response.
    pub fn was_successful(&self) -> bool {
        self.status == VerificationStatus::Completed && self.response_code == Some(200)
    }

    pub fn has_failed(&self) -> bool {
        !self.was_successful()
    }
}
