//! In-Memory Verification Store Adapter
//!
//! Keeps verification records in memory behind a single lock, so each port
//! operation (including the delete cascade) is one critical section.
//! Useful for testing and local runs without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::verification::{
    AuthenticationUpsert, NewVerification, NewVerificationAttempt, UserAuthentication,
    Verification, VerificationAttempt, VerificationUpdate,
};
use crate::ports::VerificationStore;

#[derive(Debug, Default)]
struct Tables {
    verifications: HashMap<String, Verification>,
    authentications: HashMap<String, UserAuthentication>,
    attempts: Vec<VerificationAttempt>,
}

/// In-memory storage for verification records
#[derive(Debug, Clone, Default)]
pub struct InMemoryVerificationStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryVerificationStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        tables.verifications.clear();
        tables.authentications.clear();
        tables.attempts.clear();
    }

    pub async fn verification_count(&self) -> usize {
        self.tables.read().await.verifications.len()
    }

    pub async fn authentication_count(&self) -> usize {
        self.tables.read().await.authentications.len()
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn create_verification(&self, new: NewVerification) -> Result<Verification, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.verifications.contains_key(&new.verification_id) {
            return Err(DomainError::new(
                ErrorCode::VerificationExists,
                format!("Verification already exists: {}", new.verification_id),
            ));
        }

        let verification = Verification::create(new, Timestamp::now());
        tables
            .verifications
            .insert(verification.verification_id.clone(), verification.clone());
        Ok(verification)
    }

    async fn find_verification_by_external_id(
        &self,
        verification_id: &str,
    ) -> Result<Option<Verification>, DomainError> {
        Ok(self.tables.read().await.verifications.get(verification_id).cloned())
    }

    async fn update_verification(
        &self,
        verification_id: &str,
        update: VerificationUpdate,
    ) -> Result<Option<Verification>, DomainError> {
        let mut tables = self.tables.write().await;
        Ok(tables.verifications.get_mut(verification_id).map(|v| {
            v.apply(update, Timestamp::now());
            v.clone()
        }))
    }

    async fn find_authentication_by_external_id(
        &self,
        authentication_id: &str,
    ) -> Result<Option<UserAuthentication>, DomainError> {
        Ok(self
            .tables
            .read()
            .await
            .authentications
            .get(authentication_id)
            .cloned())
    }

    async fn upsert_authentication_by_external_id(
        &self,
        authentication_id: &str,
        upsert: AuthenticationUpsert,
    ) -> Result<UserAuthentication, DomainError> {
        let now = Timestamp::now();
        let mut tables = self.tables.write().await;
        let auth = match tables.authentications.get_mut(authentication_id) {
            Some(existing) => {
                existing.apply(upsert, now);
                existing.clone()
            }
            None => {
                let created = UserAuthentication::create(authentication_id, upsert, now);
                tables
                    .authentications
                    .insert(authentication_id.to_string(), created.clone());
                created
            }
        };
        Ok(auth)
    }

    async fn record_attempt(
        &self,
        attempt: NewVerificationAttempt,
    ) -> Result<VerificationAttempt, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.verifications.contains_key(&attempt.verification_id) {
            return Err(DomainError::new(
                ErrorCode::VerificationNotFound,
                format!("Verification not found: {}", attempt.verification_id),
            ));
        }

        let next = tables
            .attempts
            .iter()
            .filter(|a| a.verification_id == attempt.verification_id)
            .map(|a| a.attempt_number)
            .max()
            .unwrap_or(0)
            + 1;

        let recorded = attempt.into_attempt(next, Timestamp::now());
        tables.attempts.push(recorded.clone());
        Ok(recorded)
    }

    async fn attempts_for(
        &self,
        verification_id: &str,
    ) -> Result<Vec<VerificationAttempt>, DomainError> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<_> = tables
            .attempts
            .iter()
            .filter(|a| a.verification_id == verification_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.attempt_number);
        Ok(attempts)
    }

    async fn verifications_for_user(&self, user_id: i64) -> Result<Vec<Verification>, DomainError> {
        let tables = self.tables.read().await;
        let mut owned: Vec<_> = tables
            .verifications
            .values()
            .filter(|v| v.user_id == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by_key(|v| v.created_at);
        Ok(owned)
    }

    async fn authentications_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserAuthentication>, DomainError> {
        let tables = self.tables.read().await;
        let mut owned: Vec<_> = tables
            .authentications
            .values()
            .filter(|a| a.user_id == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by_key(|a| a.created_at);
        Ok(owned)
    }

    async fn delete_verification(&self, verification_id: &str) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.verifications.remove(verification_id).is_none() {
            return Ok(false);
        }

        tables.attempts.retain(|a| a.verification_id != verification_id);
        for auth in tables.authentications.values_mut() {
            if auth.verification_id.as_deref() == Some(verification_id) {
                auth.verification_id = None;
            }
        }
        Ok(true)
    }
}
