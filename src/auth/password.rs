/// Password Hashing and Verification
///
/// bcrypt at the default cost factor, so a single verification costs a few hundred
/// milliseconds of CPU. Strength rules are not enforced here; any input hashes.
///
/// bcrypt reads at most 72 bytes, so the password is first reduced to the hex form of
/// its SHA-256 digest (64 bytes) and every byte of input affects the stored hash.

use bcrypt::{hash, verify, DEFAULT_COST};
use sha2::{Digest, Sha256};

use crate::error::PasswordError;

fn prehash(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password using bcrypt with a random salt
///
/// # Errors
/// Returns `HashingError` only if bcrypt itself fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash(prehash(password), DEFAULT_COST).map_err(|e| PasswordError::HashingError(e.to_string()))
}

/// Verify a password against its stored hash
///
/// # Errors
/// - `CredentialMismatch` if the password does not match
/// - `InvalidHashFormat` if the stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    match verify(prehash(password), hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(PasswordError::CredentialMismatch),
        Err(e) => {
            tracing::debug!("Stored password hash rejected by bcrypt: {}", e);
            Err(PasswordError::InvalidHashFormat)
        }
    }
}
