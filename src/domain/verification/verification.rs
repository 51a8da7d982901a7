//! Verification record.
//!
//! A Verification is one identity check requested from the provider. The
//! provider owns the `verification_id`; this crate only tracks its state as
//! reported by webhook callbacks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::domain::foundation::{Score, Timestamp};

use super::{VerificationResult, VerificationStatus, VerificationType};

/// A stored identity verification.
///
/// # Invariants
///
/// - `verification_id` is unique and never changes
/// - `result` other than `Pending` implies a terminal `status`
/// - `completed_at` is set once, when `status` first becomes `Completed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// Provider-assigned external id.
    pub verification_id: String,

    /// Owning application's user, if known.
    pub user_id: Option<i64>,

    pub verification_type: VerificationType,

    pub country: Option<String>,

    pub document_type: Option<String>,

    pub status: VerificationStatus,

    pub result: VerificationResult,

    /// Only meaningful once completed.
    pub confidence_score: Score,

    /// Open key/value map. Failure callbacks replace it wholesale.
    pub metadata: Map<String, JsonValue>,

    pub completed_at: Option<Timestamp>,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}

/// Data required to register a pending verification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVerification {
    pub verification_id: String,
    pub user_id: Option<i64>,
    pub verification_type: VerificationType,
    pub country: Option<String>,
    pub document_type: Option<String>,
    pub metadata: Map<String, JsonValue>,
}

impl NewVerification {
    /// A pending IDV request with no owner or extra data.
    pub fn idv(verification_id: impl Into<String>) -> Self {
        Self {
            verification_id: verification_id.into(),
            user_id: None,
            verification_type: VerificationType::Idv,
            country: None,
            document_type: None,
            metadata: Map::new(),
        }
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Field set applied to an existing verification.
///
/// `None` leaves the stored value unchanged. `metadata` replaces the whole map.
/// `completed_at` only fills an empty slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationUpdate {
    pub status: Option<VerificationStatus>,
    pub result: Option<VerificationResult>,
    pub confidence_score: Option<Score>,
    pub metadata: Option<Map<String, JsonValue>>,
    pub completed_at: Option<Timestamp>,
}

impl Verification {
    /// Builds a freshly requested verification in `Pending` state.
    pub fn create(new: NewVerification, now: Timestamp) -> Self {
        Self {
            verification_id: new.verification_id,
            user_id: new.user_id,
            verification_type: new.verification_type,
            country: new.country,
            document_type: new.document_type,
            status: VerificationStatus::Pending,
            result: VerificationResult::Pending,
            confidence_score: Score::ZERO,
            metadata: new.metadata,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an update in place and bumps `updated_at`.
    pub fn apply(&mut self, update: VerificationUpdate, now: Timestamp) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(result) = update.result {
            self.result = result;
        }
        if let Some(score) = update.confidence_score {
            self.confidence_score = score;
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata;
        }
        // First completion wins; replays keep the original instant.
        if self.completed_at.is_none() {
            self.completed_at = update.completed_at;
        }
        self.updated_at = now;
    }

    pub fn is_completed(&self) -> bool {
        self.status == VerificationStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == VerificationStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.result == VerificationResult::Approved
    }

    pub fn is_rejected(&self) -> bool {
        self.result == VerificationResult::Rejected
    }

    /// The reason recorded by the last failure callback, if any.
    pub fn failure_reason(&self) -> Option<&JsonValue> {
        self.metadata.get("failure_reason")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending(id: &str) -> Verification {
        Verification::create(NewVerification::idv(id), Timestamp::from_unix_secs(1_000))
    }

    #[test]
    fn create_starts_pending_with_zero_score() {
        let v = pending("ver_1");

        assert_eq!(v.verification_id, "ver_1");
        assert!(v.is_pending());
        assert!(!v.is_completed());
        assert_eq!(v.result, VerificationResult::Pending);
        assert_eq!(v.confidence_score, Score::ZERO);
        assert!(v.completed_at.is_none());
        assert_eq!(v.created_at, v.updated_at);
    }

    #[test]
    fn apply_sets_only_present_fields() {
        let mut v = pending("ver_1");
        v.metadata.insert("source".into(), json!("mobile"));
        let now = Timestamp::from_unix_secs(2_000);

        v.apply(
            VerificationUpdate {
                status: Some(VerificationStatus::Completed),
                result: Some(VerificationResult::Approved),
                confidence_score: Some(Score::try_new("confidence_score", 95.5).unwrap()),
                completed_at: Some(now),
                ..Default::default()
            },
            now,
        );

        assert!(v.is_completed());
        assert!(v.is_approved());
        assert_eq!(v.confidence_score.value(), 95.5);
        assert_eq!(v.completed_at, Some(now));
        assert_eq!(v.updated_at, now);
        assert_eq!(v.metadata.get("source"), Some(&json!("mobile")));
    }

    #[test]
    fn apply_replaces_metadata_wholesale() {
        let mut v = pending("ver_2");
        v.metadata.insert("source".into(), json!("mobile"));

        let mut replacement = Map::new();
        replacement.insert("failure_reason".into(), json!("document_expired"));
        v.apply(
            VerificationUpdate {
                status: Some(VerificationStatus::Failed),
                result: Some(VerificationResult::Rejected),
                metadata: Some(replacement),
                ..Default::default()
            },
            Timestamp::from_unix_secs(3_000),
        );

        assert!(v.is_rejected());
        assert_eq!(v.metadata.len(), 1);
        assert_eq!(v.failure_reason(), Some(&json!("document_expired")));
    }

    #[test]
    fn completed_at_is_not_restamped_by_a_later_update() {
        let mut v = pending("ver_1");
        let first = Timestamp::from_unix_secs(2_000);
        let later = Timestamp::from_unix_secs(2_060);
        let completion = |at| VerificationUpdate {
            status: Some(VerificationStatus::Completed),
            completed_at: Some(at),
            ..Default::default()
        };

        v.apply(completion(first), first);
        v.apply(completion(later), later);

        assert_eq!(v.completed_at, Some(first));
        assert_eq!(v.updated_at, later);
    }

    #[test]
    fn empty_update_only_touches_updated_at() {
        let mut v = pending("ver_3");
        let before = v.clone();
        let now = Timestamp::from_unix_secs(5_000);

        v.apply(VerificationUpdate::default(), now);

        assert_eq!(v.status, before.status);
        assert_eq!(v.metadata, before.metadata);
        assert_eq!(v.updated_at, now);
    }
}
