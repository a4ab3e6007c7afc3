/// Authentication module
///
/// Password hashing, access token issuance/validation, refresh token management,
/// Authorization header parsing, and the orchestrator that ties them together.

mod claims;
mod header;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use claims::{Claims, ISSUER};
pub use header::{extract_api_key, extract_bearer_token};
pub use jwt::{generate_access_token, validate_access_token};
pub use password::{hash_password, verify_password};
pub use refresh_token::{generate_refresh_token, RefreshTokenGrant, RefreshTokenStore};
pub use service::{AuthService, LoginOutcome};
