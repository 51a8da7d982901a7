//! CheckVerificationHandler - Query handler answering whether a user holds an
//! approved check of the required kind.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::verification::RequiredVerification;
use crate::ports::VerificationStore;

use super::{GetUserStandingHandler, GetUserStandingQuery};

/// Query to check a user's verification.
#[derive(Debug, Clone, Copy)]
pub struct CheckVerificationQuery {
    pub user_id: i64,
    pub required: RequiredVerification,
}

/// Result of a verification check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckVerificationResult {
    pub is_verified: bool,
    /// Echoed back so a denial can name what is missing.
    pub required: RequiredVerification,
}

/// Handler for verification checks.
pub struct CheckVerificationHandler {
    standing: GetUserStandingHandler,
}

impl CheckVerificationHandler {
    pub fn new(store: Arc<dyn VerificationStore>) -> Self {
        Self {
            standing: GetUserStandingHandler::new(store),
        }
    }

    pub async fn handle(
        &self,
        query: CheckVerificationQuery,
    ) -> Result<CheckVerificationResult, DomainError> {
        let standing = self
            .standing
            .handle(GetUserStandingQuery {
                user_id: query.user_id,
            })
            .await?;

        let is_verified = standing.satisfies(query.required);
        if !is_verified {
            tracing::info!(
                user_id = query.user_id,
                required = %query.required,
                "user is not verified"
            );
        }

        Ok(CheckVerificationResult {
            is_verified,
            required: query.required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryVerificationStore;
    use crate::domain::foundation::{ErrorCode, Timestamp};
    use crate::domain::verification::{
        AuthenticationUpsert, NewVerification, NewVerificationAttempt, UserAuthentication,
        Verification, VerificationAttempt, VerificationResult, VerificationStatus,
        VerificationType, VerificationUpdate,
    };
    use async_trait::async_trait;

    async fn approved(store: &InMemoryVerificationStore, new: NewVerification) {
        let id = new.verification_id.clone();
        store.create_verification(new).await.unwrap();
        store
            .update_verification(
                &id,
                VerificationUpdate {
                    status: Some(VerificationStatus::Completed),
                    result: Some(VerificationResult::Approved),
                    completed_at: Some(Timestamp::now()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    fn query(required: RequiredVerification) -> CheckVerificationQuery {
        CheckVerificationQuery {
            user_id: 7,
            required,
        }
    }

    #[tokio::test]
    async fn approved_idv_satisfies_idv_and_any() {
        let store = Arc::new(InMemoryVerificationStore::new());
        approved(&store, NewVerification::idv("ver_1").with_user_id(7)).await;
        let handler = CheckVerificationHandler::new(store);

        assert!(handler.handle(query(RequiredVerification::Idv)).await.unwrap().is_verified);
        assert!(handler.handle(query(RequiredVerification::Any)).await.unwrap().is_verified);

        let result = handler
            .handle(query(RequiredVerification::Authentication))
            .await
            .unwrap();
        assert!(!result.is_verified);
        assert_eq!(result.required, RequiredVerification::Authentication);
    }

    #[tokio::test]
    async fn age_verification_does_not_satisfy_idv() {
        let store = Arc::new(InMemoryVerificationStore::new());
        let mut new = NewVerification::idv("ver_age").with_user_id(7);
        new.verification_type = VerificationType::AgeVerification;
        approved(&store, new).await;
        let handler = CheckVerificationHandler::new(store);

        assert!(!handler.handle(query(RequiredVerification::Idv)).await.unwrap().is_verified);
        assert!(handler.handle(query(RequiredVerification::Any)).await.unwrap().is_verified);
    }

    #[tokio::test]
    async fn successful_authentication_satisfies_authentication() {
        let store = Arc::new(InMemoryVerificationStore::new());
        store
            .upsert_authentication_by_external_id(
                "auth_1",
                AuthenticationUpsert {
                    user_id: Some(7),
                    status: Some(VerificationStatus::Completed),
                    result: Some(VerificationResult::Approved),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let handler = CheckVerificationHandler::new(store);

        assert!(
            handler
                .handle(query(RequiredVerification::Authentication))
                .await
                .unwrap()
                .is_verified
        );
    }

    struct UnavailableStore;

    #[async_trait]
    impl VerificationStore for UnavailableStore {
        async fn create_verification(&self, _: NewVerification) -> Result<Verification, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn find_verification_by_external_id(
            &self,
            _: &str,
        ) -> Result<Option<Verification>, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn update_verification(
            &self,
            _: &str,
            _: VerificationUpdate,
        ) -> Result<Option<Verification>, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn find_authentication_by_external_id(
            &self,
            _: &str,
        ) -> Result<Option<UserAuthentication>, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn upsert_authentication_by_external_id(
            &self,
            _: &str,
            _: AuthenticationUpsert,
        ) -> Result<UserAuthentication, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn record_attempt(
            &self,
            _: NewVerificationAttempt,
        ) -> Result<VerificationAttempt, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn attempts_for(
            &self,
            _: &str,
        ) -> Result<Vec<VerificationAttempt>, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn verifications_for_user(&self, _: i64) -> Result<Vec<Verification>, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn authentications_for_user(
            &self,
            _: i64,
        ) -> Result<Vec<UserAuthentication>, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn delete_verification(&self, _: &str) -> Result<bool, DomainError> {
            Err(DomainError::database("down"))
        }
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let handler = CheckVerificationHandler::new(Arc::new(UnavailableStore));

        let err = handler
            .handle(query(RequiredVerification::Any))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
