/// Refresh Token Management
///
/// Refresh tokens are:
/// - 256 bits from the thread-local CSPRNG, hex-encoded (64 characters)
/// - Stored by value as the primary key of their record
/// - Long-lived and reusable: refreshing an access token never rotates them
/// - Invalidated only by expiry or explicit revocation

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, RngCore};
use uuid::Uuid;

use crate::error::{DatabaseError, RefreshTokenError};
use crate::repository::{NewRefreshToken, RefreshTokenRepository};

const TOKEN_BYTES: usize = 32;
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Generate a new cryptographically secure refresh token
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Outcome of a successful refresh token validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTokenGrant {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Issues, validates and revokes refresh tokens.
///
/// All writes to refresh token records go through this type.
#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { repository }
    }

    /// Create and persist a refresh token for `user_id`, valid for `ttl`
    ///
    /// A value that collides with an existing record is discarded and regenerated.
    ///
    /// # Errors
    /// Returns `StorageUnavailable` if the store fails, no unique value could be
    /// allocated, or `ttl` puts the expiry out of range
    pub async fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, RefreshTokenError> {
        let expires_at = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
            RefreshTokenError::StorageUnavailable(format!(
                "refresh token lifetime {} is out of range",
                ttl
            ))
        })?;

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let candidate = NewRefreshToken {
                token: generate_refresh_token(),
                user_id,
                expires_at,
            };

            match self.repository.insert(&candidate).await {
                Ok(_) => {
                    tracing::debug!(user_id = %user_id, "Refresh token issued");
                    return Ok(candidate.token);
                }
                Err(DatabaseError::UniqueConstraintViolation(_)) => {
                    tracing::warn!(
                        user_id = %user_id,
                        attempt = attempt,
                        "Refresh token collided with an existing record, regenerating"
                    );
                }
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "Failed to store refresh token");
                    return Err(e.into());
                }
            }
        }

        Err(RefreshTokenError::StorageUnavailable(format!(
            "no unique refresh token after {} attempts",
            MAX_ISSUE_ATTEMPTS
        )))
    }

    /// Validate a refresh token
    ///
    /// Checks, in order:
    /// 1. Token exists
    /// 2. Token has not been revoked
    /// 3. Token has not expired
    ///
    /// A token that is both revoked and expired reports `TokenRevoked`.
    pub async fn validate(&self, token: &str) -> Result<RefreshTokenGrant, RefreshTokenError> {
        let record = self
            .repository
            .find(token)
            .await?
            .ok_or(RefreshTokenError::TokenNotFound)?;

        if record.is_revoked() {
            tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
            return Err(RefreshTokenError::TokenRevoked);
        }

        if record.is_expired_at(Utc::now()) {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            return Err(RefreshTokenError::TokenExpired);
        }

        Ok(RefreshTokenGrant {
            user_id: record.user_id,
            expires_at: record.expires_at,
        })
    }

    /// Revoke a refresh token
    ///
    /// Revoking an already revoked token succeeds and moves `revoked_at` to now.
    ///
    /// # Errors
    /// Returns `TokenNotFound` if no record has this value
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        if self.repository.revoke(token, Utc::now()).await? {
            Ok(())
        } else {
            Err(RefreshTokenError::TokenNotFound)
        }
    }
}
