/// Access token claims
///
/// The JWT payload: registered claims plus `exp_micros`, the exact expiry instant.
/// `exp` is kept for other JWT consumers and is rounded up to the next whole second.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AccessTokenError;

/// Issuer stamped into every access token this service signs.
pub const ISSUER: &str = "bulletin";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp, seconds, rounded up)
    pub exp: i64,
    /// Expiration time (Unix timestamp, microseconds)
    pub exp_micros: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create claims for `user_id` that expire `ttl` from now
    ///
    /// # Errors
    /// Returns `SigningError` if `ttl` pushes the expiry past the representable range
    pub fn new(user_id: Uuid, ttl: Duration) -> Result<Self, AccessTokenError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AccessTokenError::SigningError(format!("token lifetime {} is out of range", ttl))
        })?;

        let exp = if expires_at.timestamp_subsec_nanos() > 0 {
            expires_at.timestamp() + 1
        } else {
            expires_at.timestamp()
        };

        Ok(Self {
            sub: user_id.to_string(),
            exp,
            exp_micros: expires_at.timestamp_micros(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
        })
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `MalformedSubject` if the subject is not a valid UUID
    pub fn user_id(&self) -> Result<Uuid, AccessTokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| AccessTokenError::MalformedSubject)
    }

    /// A token is expired from the microsecond its expiry is reached
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_micros() >= self.exp_micros
    }
}
