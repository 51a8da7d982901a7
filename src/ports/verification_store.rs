//! VerificationStore port - Record store for verifications, authentications
//! and callback attempts.
//!
//! Every mutation must be atomic on its own: a concurrent reader sees either
//! the old row or the new row, never a mix. Same-id writers are
//! last-write-wins at the field level.
//!
//! # Deletion policy
//!
//! Deleting a verification removes its attempts and clears the
//! `verification_id` back-reference on any authentication that pointed at it.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::verification::{
    AuthenticationUpsert, NewVerification, NewVerificationAttempt, UserAuthentication,
    Verification, VerificationAttempt, VerificationUpdate,
};

/// Repository port for verification records.
///
/// # Example
///
/// ```ignore
/// let Some(existing) = store.find_verification_by_external_id("ver_1").await? else {
///     return Ok(DispatchOutcome::Ignored(IgnoreReason::NotFound));
/// };
/// let updated = store.update_verification(&existing.verification_id, update).await?;
/// ```
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Register a new pending verification.
    ///
    /// # Errors
    ///
    /// - `VerificationExists` if the external id is already stored
    /// - `DatabaseError` on persistence failure
    async fn create_verification(&self, new: NewVerification) -> Result<Verification, DomainError>;

    /// Find a verification by the provider's id.
    ///
    /// Returns `None` if not found.
    async fn find_verification_by_external_id(
        &self,
        verification_id: &str,
    ) -> Result<Option<Verification>, DomainError>;

    /// Apply a field set to an existing verification and return the new state.
    ///
    /// Returns `None` if the verification does not exist (including one
    /// deleted between lookup and update).
    async fn update_verification(
        &self,
        verification_id: &str,
        update: VerificationUpdate,
    ) -> Result<Option<Verification>, DomainError>;

    /// Find an authentication by the provider's id.
    async fn find_authentication_by_external_id(
        &self,
        authentication_id: &str,
    ) -> Result<Option<UserAuthentication>, DomainError>;

    /// Create the authentication if absent, then apply the field set.
    ///
    /// Two concurrent upserts of an unseen id never produce two rows.
    async fn upsert_authentication_by_external_id(
        &self,
        authentication_id: &str,
        upsert: AuthenticationUpsert,
    ) -> Result<UserAuthentication, DomainError>;

    /// Append an attempt, numbering it one past the highest existing number
    /// for the same verification.
    ///
    /// # Errors
    ///
    /// - `VerificationNotFound` if the verification does not exist
    /// - `DatabaseError` on persistence failure
    async fn record_attempt(
        &self,
        attempt: NewVerificationAttempt,
    ) -> Result<VerificationAttempt, DomainError>;

    /// All attempts for a verification, ordered by attempt number.
    async fn attempts_for(
        &self,
        verification_id: &str,
    ) -> Result<Vec<VerificationAttempt>, DomainError>;

    /// Verifications owned by a user, oldest first.
    async fn verifications_for_user(&self, user_id: i64) -> Result<Vec<Verification>, DomainError>;

    /// Authentications owned by a user, oldest first.
    async fn authentications_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserAuthentication>, DomainError>;

    /// Delete a verification, applying the deletion policy.
    ///
    /// Returns `false` if nothing was deleted.
    async fn delete_verification(&self, verification_id: &str) -> Result<bool, DomainError>;
}
