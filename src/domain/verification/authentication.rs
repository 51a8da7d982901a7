//! User authentication record.
//!
//! Authentications are created lazily: the first webhook that names an
//! `authentication_id` creates the row.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::domain::foundation::{Score, Timestamp};

use super::{VerificationResult, VerificationStatus};

/// Liveness is detected when the score is strictly above this value.
pub const LIVENESS_THRESHOLD: f64 = 70.0;

/// Faces match when the score is strictly above this value.
pub const FACE_MATCH_THRESHOLD: f64 = 80.0;

/// A stored facial authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAuthentication {
    /// Provider-assigned external id.
    pub authentication_id: String,

    /// External id of the verification this authentication was checked
    /// against. Weak reference; cleared when that verification is deleted.
    pub verification_id: Option<String>,

    pub user_id: Option<i64>,

    pub status: VerificationStatus,

    pub result: VerificationResult,

    pub confidence_score: Score,

    pub liveness_score: Score,

    pub face_match_score: Score,

    pub device_info: Map<String, JsonValue>,

    pub location_data: Map<String, JsonValue>,

    pub authenticated_at: Option<Timestamp>,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}

/// Field set written by an authentication callback.
///
/// `verification_id` is tri-state: `None` leaves it unchanged,
/// `Some(None)` clears it, `Some(Some(id))` sets it. `user_id` is written
/// by the host application when it registers the request; callbacks leave it
/// alone. `authenticated_at` only fills an empty slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthenticationUpsert {
    pub verification_id: Option<Option<String>>,
    pub user_id: Option<i64>,
    pub status: Option<VerificationStatus>,
    pub result: Option<VerificationResult>,
    pub confidence_score: Option<Score>,
    pub liveness_score: Option<Score>,
    pub face_match_score: Option<Score>,
    pub device_info: Option<Map<String, JsonValue>>,
    pub authenticated_at: Option<Timestamp>,
}

impl UserAuthentication {
    /// Builds a record for an id seen for the first time, with the upsert applied.
    pub fn create(
        authentication_id: impl Into<String>,
        upsert: AuthenticationUpsert,
        now: Timestamp,
    ) -> Self {
        let mut auth = Self {
            authentication_id: authentication_id.into(),
            verification_id: None,
            user_id: None,
            status: VerificationStatus::Pending,
            result: VerificationResult::Pending,
            confidence_score: Score::ZERO,
            liveness_score: Score::ZERO,
            face_match_score: Score::ZERO,
            device_info: Map::new(),
            location_data: Map::new(),
            authenticated_at: None,
            created_at: now,
            updated_at: now,
        };
        auth.apply(upsert, now);
        auth
    }

    /// Applies an upsert in place and bumps `updated_at`.
    pub fn apply(&mut self, upsert: AuthenticationUpsert, now: Timestamp) {
        if let Some(verification_id) = upsert.verification_id {
            self.verification_id = verification_id;
        }
        if let Some(user_id) = upsert.user_id {
            self.user_id = Some(user_id);
        }
        if let Some(status) = upsert.status {
            self.status = status;
        }
        if let Some(result) = upsert.result {
            self.result = result;
        }
        if let Some(score) = upsert.confidence_score {
            self.confidence_score = score;
        }
        if let Some(score) = upsert.liveness_score {
            self.liveness_score = score;
        }
        if let Some(score) = upsert.face_match_score {
            self.face_match_score = score;
        }
        if let Some(device_info) = upsert.device_info {
            self.device_info = device_info;
        }
        if self.authenticated_at.is_none() {
            self.authenticated_at = upsert.authenticated_at;
        }
        self.updated_at = now;
    }

    pub fn liveness_detected(&self) -> bool {
        self.liveness_score.exceeds(LIVENESS_THRESHOLD)
    }

    pub fn face_matches(&self) -> bool {
        self.face_match_score.exceeds(FACE_MATCH_THRESHOLD)
    }

    pub fn is_completed(&self) -> bool {
        self.status == VerificationStatus::Completed
    }

    /// Completed and approved.
    pub fn is_successful(&self) -> bool {
        self.is_completed() && self.result == VerificationResult::Approved
    }
}
