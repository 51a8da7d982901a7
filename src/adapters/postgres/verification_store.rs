//! PostgreSQL implementation of VerificationStore.
//!
//! Each mutation is a single statement (`UPDATE ... RETURNING`,
//! `INSERT ... ON CONFLICT ... RETURNING`) except attempt numbering and
//! deletion, which run in a transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Score, Timestamp};
use crate::domain::verification::{
    AuthenticationUpsert, NewVerification, NewVerificationAttempt, UserAuthentication,
    Verification, VerificationAttempt, VerificationUpdate,
};
use crate::ports::VerificationStore;

const VERIFICATION_COLUMNS: &str = r#"
    verification_id, user_id, verification_type, country, document_type,
    status, result, confidence_score, metadata, completed_at, created_at, updated_at
"#;

const AUTHENTICATION_COLUMNS: &str = r#"
    authentication_id, verification_id, user_id, status, result,
    confidence_score, liveness_score, face_match_score,
    device_info, location_data, authenticated_at, created_at, updated_at
"#;

const ATTEMPT_COLUMNS: &str = r#"
    verification_id, attempt_number, status, response_code, error_message,
    response_data, ip_address, user_agent, created_at
"#;

/// PostgreSQL implementation of the VerificationStore port.
pub struct PostgresVerificationStore {
    pool: PgPool,
}

impl PostgresVerificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Row types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, sqlx::FromRow)]
struct VerificationRow {
    verification_id: String,
    user_id: Option<i64>,
    verification_type: String,
    country: Option<String>,
    document_type: Option<String>,
    status: String,
    result: String,
    confidence_score: f64,
    metadata: Json<Map<String, JsonValue>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VerificationRow> for Verification {
    type Error = DomainError;

    fn try_from(row: VerificationRow) -> Result<Self, Self::Error> {
        Ok(Verification {
            verification_id: row.verification_id,
            user_id: row.user_id,
            verification_type: row.verification_type.parse().map_err(corrupt_row)?,
            country: row.country,
            document_type: row.document_type,
            status: row.status.parse().map_err(corrupt_row)?,
            result: row.result.parse().map_err(corrupt_row)?,
            confidence_score: score("confidence_score", row.confidence_score)?,
            metadata: row.metadata.0,
            completed_at: row.completed_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuthenticationRow {
    authentication_id: String,
    verification_id: Option<String>,
    user_id: Option<i64>,
    status: String,
    result: String,
    confidence_score: f64,
    liveness_score: f64,
    face_match_score: f64,
    device_info: Json<Map<String, JsonValue>>,
    location_data: Json<Map<String, JsonValue>>,
    authenticated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AuthenticationRow> for UserAuthentication {
    type Error = DomainError;

    fn try_from(row: AuthenticationRow) -> Result<Self, Self::Error> {
        Ok(UserAuthentication {
            authentication_id: row.authentication_id,
            verification_id: row.verification_id,
            user_id: row.user_id,
            status: row.status.parse().map_err(corrupt_row)?,
            result: row.result.parse().map_err(corrupt_row)?,
            confidence_score: score("confidence_score", row.confidence_score)?,
            liveness_score: score("liveness_score", row.liveness_score)?,
            face_match_score: score("face_match_score", row.face_match_score)?,
            device_info: row.device_info.0,
            location_data: row.location_data.0,
            authenticated_at: row.authenticated_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AttemptRow {
    verification_id: String,
    attempt_number: i32,
    status: String,
    response_code: Option<i32>,
    error_message: Option<String>,
    response_data: Option<Json<JsonValue>>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttemptRow> for VerificationAttempt {
    type Error = DomainError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(VerificationAttempt {
            verification_id: row.verification_id,
            attempt_number: row.attempt_number,
            status: row.status.parse().map_err(corrupt_row)?,
            response_code: row.response_code,
            error_message: row.error_message,
            response_data: row.response_data.map(|j| j.0).unwrap_or(JsonValue::Null),
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn corrupt_row(err: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored value: {}", err))
}

fn score(field: &str, value: f64) -> Result<Score, DomainError> {
    Score::try_new(field, value).map_err(corrupt_row)
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("{}: {}", context, e))
}

// ════════════════════════════════════════════════════════════════════════════
// Port implementation
// ════════════════════════════════════════════════════════════════════════════

#[async_trait]
impl VerificationStore for PostgresVerificationStore {
    async fn create_verification(&self, new: NewVerification) -> Result<Verification, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO verifications (
                verification_id, user_id, verification_type, country, document_type, metadata
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VERIFICATION_COLUMNS}
            "#
        );

        let row: VerificationRow = sqlx::query_as(&sql)
            .bind(&new.verification_id)
            .bind(new.user_id)
            .bind(new.verification_type.as_str())
            .bind(&new.country)
            .bind(&new.document_type)
            .bind(Json(&new.metadata))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.constraint() == Some("verifications_verification_id_key") {
                        return DomainError::new(
                            ErrorCode::VerificationExists,
                            format!("Verification already exists: {}", new.verification_id),
                        );
                    }
                }
                DomainError::database(format!("Failed to create verification: {}", e))
            })?;

        row.try_into()
    }

    async fn find_verification_by_external_id(
        &self,
        verification_id: &str,
    ) -> Result<Option<Verification>, DomainError> {
        let sql = format!(
            "SELECT {VERIFICATION_COLUMNS} FROM verifications WHERE verification_id = $1"
        );

        let row: Option<VerificationRow> = sqlx::query_as(&sql)
            .bind(verification_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find verification"))?;

        row.map(Verification::try_from).transpose()
    }

    async fn update_verification(
        &self,
        verification_id: &str,
        update: VerificationUpdate,
    ) -> Result<Option<Verification>, DomainError> {
        let sql = format!(
            r#"
            UPDATE verifications SET
                status = COALESCE($2::text, status),
                result = COALESCE($3::text, result),
                confidence_score = COALESCE($4::float8, confidence_score),
                metadata = COALESCE($5::jsonb, metadata),
                completed_at = COALESCE(completed_at, $6::timestamptz),
                updated_at = NOW()
            WHERE verification_id = $1
            RETURNING {VERIFICATION_COLUMNS}
            "#
        );

        let row: Option<VerificationRow> = sqlx::query_as(&sql)
            .bind(verification_id)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.result.map(|r| r.as_str()))
            .bind(update.confidence_score.map(|s| s.value()))
            .bind(update.metadata.map(Json))
            .bind(update.completed_at.map(|t| *t.as_datetime()))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update verification"))?;

        row.map(Verification::try_from).transpose()
    }

    async fn find_authentication_by_external_id(
        &self,
        authentication_id: &str,
    ) -> Result<Option<UserAuthentication>, DomainError> {
        let sql = format!(
            "SELECT {AUTHENTICATION_COLUMNS} FROM user_authentications WHERE authentication_id = $1"
        );

        let row: Option<AuthenticationRow> = sqlx::query_as(&sql)
            .bind(authentication_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find authentication"))?;

        row.map(UserAuthentication::try_from).transpose()
    }

    async fn upsert_authentication_by_external_id(
        &self,
        authentication_id: &str,
        upsert: AuthenticationUpsert,
    ) -> Result<UserAuthentication, DomainError> {
        // $2 says whether verification_id was supplied; $3 is its value (may be NULL).
        let sql = format!(
            r#"
            INSERT INTO user_authentications (
                authentication_id, verification_id, user_id, status, result,
                confidence_score, liveness_score, face_match_score,
                device_info, authenticated_at
            ) VALUES (
                $1, $3::text, $11::bigint,
                COALESCE($4::text, 'pending'), COALESCE($5::text, 'pending'),
                COALESCE($6::float8, 0), COALESCE($7::float8, 0), COALESCE($8::float8, 0),
                COALESCE($9::jsonb, '{{}}'::jsonb), $10::timestamptz
            )
            ON CONFLICT (authentication_id) DO UPDATE SET
                verification_id = CASE WHEN $2::boolean
                    THEN EXCLUDED.verification_id
                    ELSE user_authentications.verification_id END,
                user_id = COALESCE($11::bigint, user_authentications.user_id),
                status = COALESCE($4::text, user_authentications.status),
                result = COALESCE($5::text, user_authentications.result),
                confidence_score = COALESCE($6::float8, user_authentications.confidence_score),
                liveness_score = COALESCE($7::float8, user_authentications.liveness_score),
                face_match_score = COALESCE($8::float8, user_authentications.face_match_score),
                device_info = COALESCE($9::jsonb, user_authentications.device_info),
                authenticated_at = COALESCE(user_authentications.authenticated_at, $10::timestamptz),
                updated_at = NOW()
            RETURNING {AUTHENTICATION_COLUMNS}
            "#
        );

        let set_verification_id = upsert.verification_id.is_some();
        let verification_id = upsert.verification_id.flatten();

        let row: AuthenticationRow = sqlx::query_as(&sql)
            .bind(authentication_id)
            .bind(set_verification_id)
            .bind(verification_id)
            .bind(upsert.status.map(|s| s.as_str()))
            .bind(upsert.result.map(|r| r.as_str()))
            .bind(upsert.confidence_score.map(|s| s.value()))
            .bind(upsert.liveness_score.map(|s| s.value()))
            .bind(upsert.face_match_score.map(|s| s.value()))
            .bind(upsert.device_info.map(Json))
            .bind(upsert.authenticated_at.map(|t| *t.as_datetime()))
            .bind(upsert.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to upsert authentication"))?;

        row.try_into()
    }

    async fn record_attempt(
        &self,
        attempt: NewVerificationAttempt,
    ) -> Result<VerificationAttempt, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        // Row lock on the parent serializes numbering per verification.
        let parent: Option<i64> =
            sqlx::query_scalar("SELECT id FROM verifications WHERE verification_id = $1 FOR UPDATE")
                .bind(&attempt.verification_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to lock verification"))?;

        if parent.is_none() {
            return Err(DomainError::new(
                ErrorCode::VerificationNotFound,
                format!("Verification not found: {}", attempt.verification_id),
            ));
        }

        let next: i32 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(attempt_number), 0) + 1
            FROM verification_attempts
            WHERE verification_id = $1
            "#,
        )
        .bind(&attempt.verification_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to number attempt"))?;

        let sql = format!(
            r#"
            INSERT INTO verification_attempts (
                verification_id, attempt_number, status, response_code, error_message,
                response_data, ip_address, user_agent
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ATTEMPT_COLUMNS}
            "#
        );

        let row: AttemptRow = sqlx::query_as(&sql)
            .bind(&attempt.verification_id)
            .bind(next)
            .bind(attempt.status.as_str())
            .bind(attempt.response_code)
            .bind(&attempt.error_message)
            .bind(Json(&attempt.response_data))
            .bind(&attempt.ip_address)
            .bind(&attempt.user_agent)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to record attempt"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit attempt"))?;

        row.try_into()
    }

    async fn attempts_for(
        &self,
        verification_id: &str,
    ) -> Result<Vec<VerificationAttempt>, DomainError> {
        let sql = format!(
            r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM verification_attempts
            WHERE verification_id = $1
            ORDER BY attempt_number
            "#
        );

        let rows: Vec<AttemptRow> = sqlx::query_as(&sql)
            .bind(verification_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to load attempts"))?;

        rows.into_iter().map(VerificationAttempt::try_from).collect()
    }

    async fn verifications_for_user(&self, user_id: i64) -> Result<Vec<Verification>, DomainError> {
        let sql = format!(
            r#"
            SELECT {VERIFICATION_COLUMNS}
            FROM verifications
            WHERE user_id = $1
            ORDER BY created_at, id
            "#
        );

        let rows: Vec<VerificationRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to load user verifications"))?;

        rows.into_iter().map(Verification::try_from).collect()
    }

    async fn authentications_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserAuthentication>, DomainError> {
        let sql = format!(
            r#"
            SELECT {AUTHENTICATION_COLUMNS}
            FROM user_authentications
            WHERE user_id = $1
            ORDER BY created_at, id
            "#
        );

        let rows: Vec<AuthenticationRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to load user authentications"))?;

        rows.into_iter().map(UserAuthentication::try_from).collect()
    }

    async fn delete_verification(&self, verification_id: &str) -> Result<bool, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        // Attempts go with the row via ON DELETE CASCADE.
        let deleted = sqlx::query("DELETE FROM verifications WHERE verification_id = $1")
            .bind(verification_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete verification"))?
            .rows_affected();

        if deleted == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE user_authentications
            SET verification_id = NULL, updated_at = NOW()
            WHERE verification_id = $1
            "#,
        )
        .bind(verification_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to clear authentication links"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit delete"))?;

        Ok(true)
    }
}
