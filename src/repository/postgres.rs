use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::{NewRefreshToken, RefreshTokenRecord, UserCredentials};
use super::{RefreshTokenRepository, UserRepository};
use crate::error::DatabaseError;

/// Postgres-backed user lookup
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DatabaseError> {
        let user = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, email, hashed_password, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

/// Postgres-backed refresh token table
///
/// `token` is the primary key, so a duplicate insert surfaces as SQLSTATE 23505.
#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, token: &NewRefreshToken) -> Result<RefreshTokenRecord, DatabaseError> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $3, $4, NULL)
            RETURNING token, user_id, created_at, updated_at, expires_at, revoked_at
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(now)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn revoke(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE token = $2
            "#,
        )
        .bind(revoked_at)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
