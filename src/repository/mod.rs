/// Repository traits for credential and refresh-token storage
///
/// The authentication core only talks to storage through these traits, so the
/// Postgres-backed implementation and the in-memory one are interchangeable.

mod memory;
mod models;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;

pub use memory::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
pub use models::{NewRefreshToken, RefreshTokenRecord, UserCredentials, UserProfile};
pub use postgres::{PgRefreshTokenRepository, PgUserRepository};

/// Read-only access to stored user credentials
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by exact email; `None` if no such user exists
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DatabaseError>;
}

/// Persistence contract for refresh tokens, keyed by token value
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Insert a new record.
    ///
    /// Must fail with `UniqueConstraintViolation` if the token value already exists,
    /// leaving the existing record untouched.
    async fn insert(&self, token: &NewRefreshToken) -> Result<RefreshTokenRecord, DatabaseError>;

    /// Select a record by exact token value
    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError>;

    /// Stamp `revoked_at` and `updated_at`; returns `false` if no record matched
    async fn revoke(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<bool, DatabaseError>;
}
