/// Authentication Orchestrator
///
/// Composes the password hasher, access token codec, refresh token store and header
/// parsing into the four flows the HTTP layer calls.

use std::sync::Arc;

use lazy_static::lazy_static;
use uuid::Uuid;

use crate::auth::header::extract_bearer_token;
use crate::auth::jwt::{generate_access_token, validate_access_token};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::RefreshTokenStore;
use crate::configuration::AuthSettings;
use crate::error::{AuthError, PasswordError, RefreshTokenError};
use crate::repository::{RefreshTokenRepository, UserProfile, UserRepository};

lazy_static! {
    // Verified against when the email is unknown, so both failures pay for one bcrypt run.
    static ref UNKNOWN_USER_HASH: Option<String> = hash_password("unknown-user").ok();
}

/// Tokens and profile returned by a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: RefreshTokenStore,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            refresh_tokens: RefreshTokenStore::new(refresh_tokens),
            settings,
        }
    }

    /// Exchange email and password for an access token and a refresh token
    ///
    /// # Security Notes
    /// - Unknown email, wrong password and an unreadable stored hash all return
    ///   `InvalidCredentials`; which one happened is only logged
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
                    let _ = verify_password(password, hash);
                }
                tracing::info!("Login rejected: no user with this email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        match verify_password(password, &user.hashed_password) {
            Ok(()) => {}
            Err(PasswordError::InvalidHashFormat) => {
                tracing::error!(user_id = %user.id, "Stored password hash is malformed");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                tracing::info!(user_id = %user.id, reason = %e, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let access_token =
            generate_access_token(&user.id, &self.settings.secret, self.settings.access_token_ttl())?;
        let refresh_token = self
            .refresh_tokens
            .issue(user.id, self.settings.refresh_token_ttl())
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            access_token,
            refresh_token,
            user: user.profile(),
        })
    }

    /// Resolve the user behind an `Authorization: Bearer <access token>` value
    pub fn authenticate_request(&self, authorization: &str) -> Result<Uuid, AuthError> {
        let token = extract_bearer_token(authorization)?;
        let user_id = validate_access_token(token, &self.settings.secret)?;
        Ok(user_id)
    }

    /// Mint a new access token from an `Authorization: Bearer <refresh token>` value
    ///
    /// The refresh token stays valid; it is not rotated.
    pub async fn refresh_access_token(&self, authorization: &str) -> Result<String, AuthError> {
        let token = extract_bearer_token(authorization)?;
        let grant = self.refresh_tokens.validate(token).await?;

        let access_token = generate_access_token(
            &grant.user_id,
            &self.settings.secret,
            self.settings.access_token_ttl(),
        )?;

        tracing::info!(user_id = %grant.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke the refresh token in an `Authorization: Bearer <refresh token>` value
    ///
    /// # Errors
    /// - `NotFound` if the token does not exist
    /// - `Unauthorized` if the header value is unusable
    pub async fn revoke_refresh_token(&self, authorization: &str) -> Result<(), AuthError> {
        let token = extract_bearer_token(authorization)?;

        match self.refresh_tokens.revoke(token).await {
            Ok(()) => {
                tracing::info!("Refresh token revoked");
                Ok(())
            }
            Err(RefreshTokenError::TokenNotFound) => Err(AuthError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::SigningSecret;
    use crate::error::{AccessTokenError, DatabaseError, HeaderError, UnauthorizedReason};
    use crate::repository::{
        InMemoryRefreshTokenRepository, InMemoryUserRepository, NewRefreshToken,
        RefreshTokenRecord, UserCredentials,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    const EMAIL: &str = "lane@example.com";
    const PASSWORD: &str = "04234";

    struct Fixture {
        service: AuthService,
        user_id: Uuid,
        users: Arc<InMemoryUserRepository>,
    }

    async fn fixture() -> Fixture {
        fixture_with_refresh_repository(Arc::new(InMemoryRefreshTokenRepository::new())).await
    }

    async fn fixture_with_refresh_repository(
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
    ) -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        users
            .insert(UserCredentials {
                id: user_id,
                email: EMAIL.to_string(),
                hashed_password: hash_password(PASSWORD).expect("Failed to hash password"),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let service = AuthService::new(
            users.clone(),
            refresh_tokens,
            AuthSettings::new(SigningSecret::new("orchestrator-test-secret")),
        );

        Fixture { service, user_id, users }
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn test_login_returns_working_tokens() {
        let f = fixture().await;

        let outcome = f.service.login(EMAIL, PASSWORD).await.unwrap();

        assert_eq!(outcome.user.id, f.user_id);
        assert_eq!(outcome.user.email, EMAIL);
        assert_eq!(
            f.service.authenticate_request(&bearer(&outcome.access_token)),
            Ok(f.user_id)
        );
        let refreshed = f
            .service
            .refresh_access_token(&bearer(&outcome.refresh_token))
            .await
            .unwrap();
        assert_eq!(f.service.authenticate_request(&bearer(&refreshed)), Ok(f.user_id));
    }

    #[tokio::test]
    async fn test_login_does_not_distinguish_failures() {
        let f = fixture().await;

        let unknown_user = f.service.login("nobody@example.com", PASSWORD).await;
        let wrong_password = f.service.login(EMAIL, "wrong").await;

        assert_eq!(unknown_user.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(wrong_password.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_with_corrupt_stored_hash() {
        let f = fixture().await;
        let now = Utc::now();
        f.users
            .insert(UserCredentials {
                id: Uuid::new_v4(),
                email: "corrupt@example.com".to_string(),
                hashed_password: "garbage".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        assert_eq!(
            f.service.login("corrupt@example.com", PASSWORD).await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_authenticate_reports_specific_reason() {
        let f = fixture().await;

        assert_eq!(
            f.service.authenticate_request("").unwrap_err(),
            AuthError::Unauthorized(UnauthorizedReason::Header(HeaderError::MissingHeader))
        );
        assert_eq!(
            f.service.authenticate_request("Bearer").unwrap_err(),
            AuthError::Unauthorized(UnauthorizedReason::Header(HeaderError::MalformedHeader))
        );
        assert_eq!(
            f.service.authenticate_request("Bearer not-a-jwt").unwrap_err(),
            AuthError::Unauthorized(UnauthorizedReason::AccessToken(
                AccessTokenError::MalformedToken
            ))
        );
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let f = fixture().await;
        let outcome = f.service.login(EMAIL, PASSWORD).await.unwrap();

        assert!(f
            .service
            .authenticate_request(&bearer(&outcome.refresh_token))
            .is_err());
        assert_eq!(
            f.service
                .refresh_access_token(&bearer(&outcome.access_token))
                .await
                .unwrap_err(),
            AuthError::Unauthorized(UnauthorizedReason::RefreshToken(
                RefreshTokenError::TokenNotFound
            ))
        );
    }

    #[tokio::test]
    async fn test_revoke_blocks_refresh_but_not_access() {
        let f = fixture().await;
        let outcome = f.service.login(EMAIL, PASSWORD).await.unwrap();

        f.service
            .revoke_refresh_token(&bearer(&outcome.refresh_token))
            .await
            .unwrap();

        assert_eq!(
            f.service
                .refresh_access_token(&bearer(&outcome.refresh_token))
                .await
                .unwrap_err(),
            AuthError::Unauthorized(UnauthorizedReason::RefreshToken(
                RefreshTokenError::TokenRevoked
            ))
        );
        assert_eq!(
            f.service.authenticate_request(&bearer(&outcome.access_token)),
            Ok(f.user_id)
        );
    }

    #[tokio::test]
    async fn test_revoke_is_repeatable_but_unknown_is_not_found() {
        let f = fixture().await;
        let outcome = f.service.login(EMAIL, PASSWORD).await.unwrap();
        let header = bearer(&outcome.refresh_token);

        assert_eq!(f.service.revoke_refresh_token(&header).await, Ok(()));
        assert_eq!(f.service.revoke_refresh_token(&header).await, Ok(()));
        assert_eq!(
            f.service.revoke_refresh_token("Bearer unknown").await,
            Err(AuthError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_each_login_gets_its_own_refresh_token() {
        let f = fixture().await;

        let first = f.service.login(EMAIL, PASSWORD).await.unwrap();
        let second = f.service.login(EMAIL, PASSWORD).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        f.service
            .revoke_refresh_token(&bearer(&first.refresh_token))
            .await
            .unwrap();
        assert!(f
            .service
            .refresh_access_token(&bearer(&second.refresh_token))
            .await
            .is_ok());
    }

    /// Refresh token storage that is down for every call.
    struct UnavailableRefreshTokens;

    #[async_trait]
    impl RefreshTokenRepository for UnavailableRefreshTokens {
        async fn insert(&self, _: &NewRefreshToken) -> Result<RefreshTokenRecord, DatabaseError> {
            Err(DatabaseError::ConnectionPool("connection refused".to_string()))
        }

        async fn find(&self, _: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
            Err(DatabaseError::ConnectionPool("connection refused".to_string()))
        }

        async fn revoke(&self, _: &str, _: DateTime<Utc>) -> Result<bool, DatabaseError> {
            Err(DatabaseError::ConnectionPool("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_login_reports_storage_outage_after_correct_password() {
        let f = fixture_with_refresh_repository(Arc::new(UnavailableRefreshTokens)).await;

        let result = f.service.login(EMAIL, PASSWORD).await;

        assert!(matches!(result, Err(AuthError::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_skips_storage() {
        let f = fixture_with_refresh_repository(Arc::new(UnavailableRefreshTokens)).await;

        assert_eq!(
            f.service.login(EMAIL, "wrong").await.map(|o| o.user.id),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_refresh_and_revoke_report_storage_outage() {
        let f = fixture_with_refresh_repository(Arc::new(UnavailableRefreshTokens)).await;

        assert!(matches!(
            f.service.refresh_access_token("Bearer abc").await,
            Err(AuthError::StorageUnavailable(_))
        ));
        assert!(matches!(
            f.service.revoke_refresh_token("Bearer abc").await,
            Err(AuthError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_unknown_user_hash_is_usable() {
        let hash = UNKNOWN_USER_HASH.as_deref().expect("Failed to build hash");

        assert_eq!(verify_password("unknown-user", hash), Ok(()));
    }
}
