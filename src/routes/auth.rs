/// Authentication Routes
///
/// Login, access token refresh, refresh token revocation, and the current user.

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthService;
use crate::error::ErrorContext;
use crate::middleware::AuthenticatedUser;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: public profile plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response carrying a new access token
#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

#[derive(Serialize)]
pub struct CurrentUserResponse {
    pub user_id: Uuid,
}

/// Raw Authorization header value; absent or non-UTF-8 headers read as empty.
fn authorization_header(req: &HttpRequest) -> &str {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
}

/// POST /api/login
///
/// # Errors
/// - 401: Unknown email or wrong password (same response for both)
/// - 503: Refresh token storage unavailable
pub async fn login(form: web::Json<LoginRequest>, auth: web::Data<AuthService>) -> HttpResponse {
    let context = ErrorContext::new("login");

    let outcome = match auth.login(&form.email, &form.password).await {
        Ok(outcome) => outcome,
        Err(e) => return context.error_response(&e),
    };

    tracing::info!(
        request_id = %context.request_id,
        user_id = %outcome.user.id,
        "Login succeeded"
    );

    HttpResponse::Ok().json(LoginResponse {
        id: outcome.user.id,
        email: outcome.user.email,
        created_at: outcome.user.created_at,
        updated_at: outcome.user.updated_at,
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    })
}

/// POST /api/refresh
///
/// Expects `Authorization: Bearer <refresh token>`. The refresh token is not rotated.
///
/// # Errors
/// - 401: Missing, unknown, revoked or expired refresh token
pub async fn refresh(req: HttpRequest, auth: web::Data<AuthService>) -> HttpResponse {
    let context = ErrorContext::new("refresh");

    match auth.refresh_access_token(authorization_header(&req)).await {
        Ok(token) => HttpResponse::Ok().json(RefreshResponse { token }),
        Err(e) => context.error_response(&e),
    }
}

/// POST /api/revoke
///
/// Expects `Authorization: Bearer <refresh token>`. Responds 204 even if the token
/// was already revoked.
///
/// # Errors
/// - 401: Missing or malformed Authorization header
/// - 404: Token does not exist
pub async fn revoke(req: HttpRequest, auth: web::Data<AuthService>) -> HttpResponse {
    let context = ErrorContext::new("revoke");

    match auth.revoke_refresh_token(authorization_header(&req)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => context.error_response(&e),
    }
}

/// GET /api/me
///
/// **Requires a valid access token**; the user is injected by `JwtMiddleware`.
pub async fn current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    let AuthenticatedUser(user_id) = user.into_inner();
    HttpResponse::Ok().json(CurrentUserResponse { user_id })
}
