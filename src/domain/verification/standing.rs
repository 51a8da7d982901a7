//! Per-user view over stored verifications and authentications.
//!
//! The host application owns its users; records only carry an optional
//! `user_id`. A standing is built from every record carrying that id and
//! answers the questions the host asks before granting access.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::domain::foundation::{Timestamp, ValidationError};

use super::{UserAuthentication, Verification, VerificationResult, VerificationType};

/// Approved verifications expire after this many days.
pub const REVERIFICATION_DAYS: i64 = 365;

/// Successful authentications expire after this many hours.
pub const REAUTHENTICATION_HOURS: i64 = 24;

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Which kind of completed check a user must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequiredVerification {
    /// An approved identity document verification.
    Idv,
    /// An approved facial authentication.
    Authentication,
    /// Any approved verification.
    #[default]
    Any,
}

impl RequiredVerification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idv => "idv",
            Self::Authentication => "authentication",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for RequiredVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequiredVerification {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idv" => Ok(Self::Idv),
            "authentication" => Ok(Self::Authentication),
            "any" => Ok(Self::Any),
            other => Err(ValidationError::invalid_value(
                "required_verification",
                format!("unknown requirement '{}'", other),
            )),
        }
    }
}

/// Everything stored for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserVerificationStanding {
    user_id: i64,
    verifications: Vec<Verification>,
    authentications: Vec<UserAuthentication>,
}

impl UserVerificationStanding {
    pub fn new(
        user_id: i64,
        verifications: Vec<Verification>,
        authentications: Vec<UserAuthentication>,
    ) -> Self {
        Self {
            user_id,
            verifications,
            authentications,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn verifications(&self) -> &[Verification] {
        &self.verifications
    }

    pub fn authentications(&self) -> &[UserAuthentication] {
        &self.authentications
    }

    // ════════════════════════════════════════════════════════════════════════
    // Verifications
    // ════════════════════════════════════════════════════════════════════════

    /// At least one verification completed and approved.
    pub fn is_verified(&self) -> bool {
        self.verifications
            .iter()
            .any(|v| v.is_completed() && v.is_approved())
    }

    /// Any verification not yet completed, failed ones included.
    pub fn has_pending_verification(&self) -> bool {
        self.verifications.iter().any(|v| !v.is_completed())
    }

    pub fn latest_verification(&self) -> Option<&Verification> {
        self.verifications.iter().max_by_key(|v| v.created_at)
    }

    /// Most recently completed approval.
    pub fn last_approved_verification(&self) -> Option<&Verification> {
        self.verifications
            .iter()
            .filter(|v| v.is_approved())
            .max_by_key(|v| v.completed_at)
    }

    pub fn last_rejected_verification(&self) -> Option<&Verification> {
        self.verifications
            .iter()
            .filter(|v| v.is_rejected())
            .max_by_key(|v| v.completed_at)
    }

    /// True when no approval exists, or the latest one is older than
    /// `days_valid` days.
    pub fn requires_reverification(&self, days_valid: i64, now: Timestamp) -> bool {
        self.last_approved_verification()
            .and_then(|v| v.completed_at)
            .map_or(true, |at| at.plus_secs(days_valid * SECS_PER_DAY) < now)
    }

    pub fn verification_count(&self) -> usize {
        self.verifications.len()
    }

    /// Approved share of all verifications, as a percentage. Zero when there
    /// are none.
    pub fn verification_approval_rate(&self) -> f64 {
        if self.verifications.is_empty() {
            return 0.0;
        }
        let approved = self.verifications.iter().filter(|v| v.is_approved()).count();
        approved as f64 / self.verifications.len() as f64 * 100.0
    }

    // ════════════════════════════════════════════════════════════════════════
    // Authentications
    // ════════════════════════════════════════════════════════════════════════

    pub fn has_completed_authentication(&self) -> bool {
        self.authentications.iter().any(|a| a.is_successful())
    }

    pub fn latest_authentication(&self) -> Option<&UserAuthentication> {
        self.authentications.iter().max_by_key(|a| a.created_at)
    }

    pub fn last_successful_authentication(&self) -> Option<&UserAuthentication> {
        self.authentications
            .iter()
            .filter(|a| a.result == VerificationResult::Approved)
            .max_by_key(|a| a.authenticated_at)
    }

    pub fn last_authentication_has_liveness(&self) -> bool {
        self.latest_authentication()
            .is_some_and(|a| a.liveness_detected())
    }

    pub fn last_authentication_face_matched(&self) -> bool {
        self.latest_authentication().is_some_and(|a| a.face_matches())
    }

    /// Mean confidence over completed authentications, zero when none.
    pub fn average_confidence_score(&self) -> f64 {
        let (sum, count) = self
            .authentications
            .iter()
            .filter(|a| a.is_completed())
            .fold((0.0, 0usize), |(sum, count), a| {
                (sum + a.confidence_score.value(), count + 1)
            });
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// True when no approved authentication exists, or the latest one is
    /// older than `hours_valid` hours.
    pub fn requires_reauthentication(&self, hours_valid: i64, now: Timestamp) -> bool {
        self.last_successful_authentication()
            .and_then(|a| a.authenticated_at)
            .map_or(true, |at| now.duration_since(&at) > Duration::hours(hours_valid))
    }

    pub fn authentication_attempt_count(&self) -> usize {
        self.authentications.len()
    }

    pub fn successful_authentication_count(&self) -> usize {
        self.authentications
            .iter()
            .filter(|a| a.result == VerificationResult::Approved)
            .count()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Access
    // ════════════════════════════════════════════════════════════════════════

    /// Whether the user holds the required kind of approved check.
    pub fn satisfies(&self, required: RequiredVerification) -> bool {
        match required {
            RequiredVerification::Idv => self.verifications.iter().any(|v| {
                v.verification_type == VerificationType::Idv && v.is_completed() && v.is_approved()
            }),
            RequiredVerification::Authentication => self.has_completed_authentication(),
            RequiredVerification::Any => self.is_verified(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Score;
    use crate::domain::verification::{
        AuthenticationUpsert, NewVerification, VerificationStatus, VerificationUpdate,
    };

    const DAY: i64 = 24 * 60 * 60;
    const T0: i64 = 1_700_000_000;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs)
    }

    fn score(v: f64) -> Score {
        Score::try_new("score", v).unwrap()
    }

    fn verification(
        id: &str,
        kind: VerificationType,
        created: i64,
        outcome: Option<(VerificationResult, i64)>,
    ) -> Verification {
        let mut new = NewVerification::idv(id).with_user_id(7);
        new.verification_type = kind;
        let mut v = Verification::create(new, at(created));
        if let Some((result, completed)) = outcome {
            v.apply(
                VerificationUpdate {
                    status: Some(VerificationStatus::Completed),
                    result: Some(result),
                    completed_at: Some(at(completed)),
                    ..Default::default()
                },
                at(completed),
            );
        }
        v
    }

    fn authentication(
        id: &str,
        created: i64,
        result: VerificationResult,
        confidence: f64,
    ) -> UserAuthentication {
        UserAuthentication::create(
            id,
            AuthenticationUpsert {
                user_id: Some(7),
                status: Some(VerificationStatus::Completed),
                result: Some(result),
                confidence_score: Some(score(confidence)),
                liveness_score: Some(score(confidence)),
                face_match_score: Some(score(confidence)),
                authenticated_at: Some(at(created)),
                ..Default::default()
            },
            at(created),
        )
    }

    fn standing(
        verifications: Vec<Verification>,
        authentications: Vec<UserAuthentication>,
    ) -> UserVerificationStanding {
        UserVerificationStanding::new(7, verifications, authentications)
    }

    #[test]
    fn empty_standing_requires_everything() {
        let s = standing(vec![], vec![]);

        assert!(!s.is_verified());
        assert!(!s.has_pending_verification());
        assert!(s.latest_verification().is_none());
        assert!(s.requires_reverification(REVERIFICATION_DAYS, at(T0)));
        assert!(s.requires_reauthentication(REAUTHENTICATION_HOURS, at(T0)));
        assert_eq!(s.verification_approval_rate(), 0.0);
        assert_eq!(s.average_confidence_score(), 0.0);
        assert!(!s.last_authentication_has_liveness());
        assert!(!s.satisfies(RequiredVerification::Any));
    }

    #[test]
    fn approved_completion_verifies_the_user() {
        let s = standing(
            vec![
                verification("ver_1", VerificationType::Idv, T0, None),
                verification(
                    "ver_2",
                    VerificationType::Idv,
                    T0 + 10,
                    Some((VerificationResult::Approved, T0 + 20)),
                ),
            ],
            vec![],
        );

        assert!(s.is_verified());
        assert!(s.has_pending_verification());
        assert_eq!(s.latest_verification().unwrap().verification_id, "ver_2");
        assert_eq!(s.verification_count(), 2);
        assert_eq!(s.verification_approval_rate(), 50.0);
    }

    #[test]
    fn last_approved_and_rejected_follow_completion_time() {
        let s = standing(
            vec![
                verification(
                    "ver_old",
                    VerificationType::Idv,
                    T0 + 50,
                    Some((VerificationResult::Approved, T0 + 60)),
                ),
                verification(
                    "ver_new",
                    VerificationType::Idv,
                    T0,
                    Some((VerificationResult::Approved, T0 + 500)),
                ),
                verification(
                    "ver_bad",
                    VerificationType::Idv,
                    T0,
                    Some((VerificationResult::Rejected, T0 + 5)),
                ),
            ],
            vec![],
        );

        assert_eq!(
            s.last_approved_verification().unwrap().verification_id,
            "ver_new"
        );
        assert_eq!(
            s.last_rejected_verification().unwrap().verification_id,
            "ver_bad"
        );
    }

    #[test]
    fn reverification_is_due_after_the_validity_window() {
        let s = standing(
            vec![verification(
                "ver_1",
                VerificationType::Idv,
                T0,
                Some((VerificationResult::Approved, T0)),
            )],
            vec![],
        );

        assert!(!s.requires_reverification(REVERIFICATION_DAYS, at(T0 + 364 * DAY)));
        assert!(!s.requires_reverification(REVERIFICATION_DAYS, at(T0 + 365 * DAY)));
        assert!(s.requires_reverification(REVERIFICATION_DAYS, at(T0 + 365 * DAY + 1)));
        assert!(s.requires_reverification(30, at(T0 + 31 * DAY)));
    }

    #[test]
    fn completed_but_unapproved_verification_does_not_count() {
        let s = standing(
            vec![verification(
                "ver_1",
                VerificationType::Idv,
                T0,
                Some((VerificationResult::Pending, T0)),
            )],
            vec![],
        );

        assert!(!s.is_verified());
        assert!(!s.has_pending_verification());
        assert!(s.requires_reverification(REVERIFICATION_DAYS, at(T0)));
    }

    #[test]
    fn authentication_queries() {
        let s = standing(
            vec![],
            vec![
                authentication("auth_1", T0, VerificationResult::Approved, 90.0),
                authentication("auth_2", T0 + 100, VerificationResult::Rejected, 40.0),
            ],
        );

        assert!(s.has_completed_authentication());
        assert_eq!(s.latest_authentication().unwrap().authentication_id, "auth_2");
        assert_eq!(
            s.last_successful_authentication().unwrap().authentication_id,
            "auth_1"
        );
        assert!(!s.last_authentication_has_liveness());
        assert!(!s.last_authentication_face_matched());
        assert_eq!(s.average_confidence_score(), 65.0);
        assert_eq!(s.authentication_attempt_count(), 2);
        assert_eq!(s.successful_authentication_count(), 1);
    }

    #[test]
    fn average_ignores_incomplete_authentications() {
        let mut pending = authentication("auth_p", T0, VerificationResult::Pending, 10.0);
        pending.status = VerificationStatus::Pending;
        let s = standing(
            vec![],
            vec![
                pending,
                authentication("auth_1", T0, VerificationResult::Approved, 80.0),
            ],
        );

        assert_eq!(s.average_confidence_score(), 80.0);
    }

    #[test]
    fn reauthentication_is_due_after_the_validity_window() {
        let s = standing(
            vec![],
            vec![authentication("auth_1", T0, VerificationResult::Approved, 95.0)],
        );

        assert!(s.last_authentication_has_liveness());
        assert!(s.last_authentication_face_matched());
        assert!(!s.requires_reauthentication(REAUTHENTICATION_HOURS, at(T0 + DAY)));
        assert!(s.requires_reauthentication(REAUTHENTICATION_HOURS, at(T0 + DAY + 1)));
    }

    #[test]
    fn satisfies_checks_the_requested_kind() {
        let age_only = standing(
            vec![verification(
                "ver_age",
                VerificationType::AgeVerification,
                T0,
                Some((VerificationResult::Approved, T0)),
            )],
            vec![],
        );
        assert!(age_only.satisfies(RequiredVerification::Any));
        assert!(!age_only.satisfies(RequiredVerification::Idv));
        assert!(!age_only.satisfies(RequiredVerification::Authentication));

        let authenticated = standing(
            vec![],
            vec![authentication("auth_1", T0, VerificationResult::Approved, 90.0)],
        );
        assert!(authenticated.satisfies(RequiredVerification::Authentication));
        assert!(!authenticated.satisfies(RequiredVerification::Any));
    }

    #[test]
    fn required_verification_parses_known_names() {
        assert_eq!("idv".parse(), Ok(RequiredVerification::Idv));
        assert_eq!(
            "authentication".parse(),
            Ok(RequiredVerification::Authentication)
        );
        assert_eq!("any".parse(), Ok(RequiredVerification::Any));
        assert!("everything".parse::<RequiredVerification>().is_err());
        assert_eq!(RequiredVerification::default().to_string(), "any");
    }
}
