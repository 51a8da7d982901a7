//! GetUserStandingHandler - Query handler loading every record a user owns.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::verification::UserVerificationStanding;
use crate::ports::VerificationStore;

/// Query for one user's standing.
#[derive(Debug, Clone, Copy)]
pub struct GetUserStandingQuery {
    pub user_id: i64,
}

/// Handler for building a [`UserVerificationStanding`].
pub struct GetUserStandingHandler {
    store: Arc<dyn VerificationStore>,
}

impl GetUserStandingHandler {
    pub fn new(store: Arc<dyn VerificationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetUserStandingQuery,
    ) -> Result<UserVerificationStanding, DomainError> {
        let verifications = self.store.verifications_for_user(query.user_id).await?;
        let authentications = self.store.authentications_for_user(query.user_id).await?;

        tracing::debug!(
            user_id = query.user_id,
            verifications = verifications.len(),
            authentications = authentications.len(),
            "user standing loaded"
        );

        Ok(UserVerificationStanding::new(
            query.user_id,
            verifications,
            authentications,
        ))
    }
}
