/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed JWTs keyed by the process signing secret.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::configuration::SigningSecret;
use crate::error::AccessTokenError;

/// Generate a new access token for a user
///
/// # Errors
/// Returns `SigningError` if token encoding fails or `ttl` is out of range
pub fn generate_access_token(
    user_id: &Uuid,
    secret: &SigningSecret,
    ttl: Duration,
) -> Result<String, AccessTokenError> {
    let claims = Claims::new(*user_id, ttl)?;

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AccessTokenError::SigningError(e.to_string()))
}

/// Validate an access token and return the user it was issued to
///
/// Checks run in a fixed order: structure and signature, then expiry, then subject.
///
/// # Errors
/// - `InvalidSignature` if the token was tampered with or signed with another secret
/// - `TokenExpired` if the signature is valid but `exp` has passed
/// - `MalformedSubject` if the subject is not a user id
/// - `MalformedToken` for anything that is not a well-formed token from this issuer
pub fn validate_access_token(token: &str, secret: &SigningSecret) -> Result<Uuid, AccessTokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    // Expiry is checked below against `exp_micros`, with no leeway.
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            let kind = classify(e.kind());
            tracing::debug!(error = %e, "JWT rejected: {}", kind);
            kind
        })?;

    if claims.is_expired() {
        return Err(AccessTokenError::TokenExpired);
    }

    claims.user_id()
}

fn classify(kind: &ErrorKind) -> AccessTokenError {
    match kind {
        ErrorKind::InvalidSignature => AccessTokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => AccessTokenError::TokenExpired,
        _ => AccessTokenError::MalformedToken,
    }
}
