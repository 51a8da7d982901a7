//! Verification notifications.
//!
//! Emitted after a webhook has been applied, so the host application can react
//! (grant access, alert support, etc.). Events are named in past tense.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventEnvelope, EventId, Timestamp};

use super::{UserAuthentication, Verification};

/// A verification reached `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCompleted {
    pub event_id: EventId,
    pub verification_id: String,
    /// Record state after the update.
    pub verification: Verification,
    pub occurred_at: Timestamp,
}

crate::domain_event!(
    VerificationCompleted => "verification.completed.v1",
    "Verification" by verification_id
);

/// A verification reached `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailed {
    pub event_id: EventId,
    pub verification_id: String,
    pub verification: Verification,
    pub occurred_at: Timestamp,
}

crate::domain_event!(
    VerificationFailed => "verification.failed.v1",
    "Verification" by verification_id
);

/// An authentication reached `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationCompleted {
    pub event_id: EventId,
    pub authentication_id: String,
    pub authentication: UserAuthentication,
    pub occurred_at: Timestamp,
}

crate::domain_event!(
    AuthenticationCompleted => "authentication.completed.v1",
    "UserAuthentication" by authentication_id
);

/// Notification produced by a dispatched webhook.
#[derive(Debug, Clone)]
pub enum VerificationNotification {
    VerificationCompleted(VerificationCompleted),
    VerificationFailed(VerificationFailed),
    AuthenticationCompleted(AuthenticationCompleted),
}

impl VerificationNotification {
    pub fn verification_completed(verification: Verification, now: Timestamp) -> Self {
        Self::VerificationCompleted(VerificationCompleted {
            event_id: EventId::new(),
            verification_id: verification.verification_id.clone(),
            verification,
            occurred_at: now,
        })
    }

    pub fn verification_failed(verification: Verification, now: Timestamp) -> Self {
        Self::VerificationFailed(VerificationFailed {
            event_id: EventId::new(),
            verification_id: verification.verification_id.clone(),
            verification,
            occurred_at: now,
        })
    }

    pub fn authentication_completed(authentication: UserAuthentication, now: Timestamp) -> Self {
        Self::AuthenticationCompleted(AuthenticationCompleted {
            event_id: EventId::new(),
            authentication_id: authentication.authentication_id.clone(),
            authentication,
            occurred_at: now,
        })
    }

    /// Wraps the notification for the event publisher, carrying the owner's
    /// user id when the record has one.
    pub fn to_envelope(&self) -> EventEnvelope {
        let (envelope, user_id) = match self {
            Self::VerificationCompleted(e) => {
                (EventEnvelope::from_event(e), e.verification.user_id)
            }
            Self::VerificationFailed(e) => (EventEnvelope::from_event(e), e.verification.user_id),
            Self::AuthenticationCompleted(e) => {
                (EventEnvelope::from_event(e), e.authentication.user_id)
            }
        };
        match user_id {
            Some(id) => envelope.with_user_id(id.to_string()),
            None => envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verification::{AuthenticationUpsert, NewVerification};

    #[test]
    fn completed_envelope_carries_type_and_id() {
        let now = Timestamp::from_unix_secs(1_700_000_000);
        let verification =
            Verification::create(NewVerification::idv("ver_1").with_user_id(7), now);

        let envelope = VerificationNotification::verification_completed(verification, now)
            .to_envelope();

        assert_eq!(envelope.event_type, "verification.completed.v1");
        assert_eq!(envelope.aggregate_id, "ver_1");
        assert_eq!(envelope.aggregate_type, "Verification");
        assert_eq!(envelope.metadata.user_id.as_deref(), Some("7"));

        let decoded: VerificationCompleted = envelope.payload_as().unwrap();
        assert_eq!(decoded.verification.verification_id, "ver_1");
    }

    #[test]
    fn failed_envelope_has_no_user_when_record_has_none() {
        let now = Timestamp::from_unix_secs(1);
        let verification = Verification::create(NewVerification::idv("ver_2"), now);

        let envelope =
            VerificationNotification::verification_failed(verification, now).to_envelope();

        assert_eq!(envelope.event_type, "verification.failed.v1");
        assert!(envelope.metadata.user_id.is_none());
    }

    #[test]
    fn authentication_envelope_uses_authentication_id() {
        let now = Timestamp::from_unix_secs(1);
        let auth = UserAuthentication::create("auth_1", AuthenticationUpsert::default(), now);

        let envelope =
            VerificationNotification::authentication_completed(auth, now).to_envelope();

        assert_eq!(envelope.aggregate_id, "auth_1");
        assert_eq!(envelope.aggregate_type, "UserAuthentication");
    }
}
