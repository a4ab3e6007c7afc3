/// Error Handling Module
///
/// Every failure in the authentication core is a typed value. This module covers:
/// 1. Component Errors (hasher, token codec, refresh store, header parsing, persistence)
/// 2. The Orchestrator Error that reaches the HTTP boundary
/// 3. HTTP Response Mapping
/// 4. Structured Error Logging with Context

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. COMPONENT ERROR TYPES
/// ============================================================================

/// Credential hasher errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    HashingError(String),
    CredentialMismatch,
    InvalidHashFormat,
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordError::HashingError(msg) => write!(f, "Password hashing failed: {}", msg),
            PasswordError::CredentialMismatch => write!(f, "Password does not match"),
            PasswordError::InvalidHashFormat => write!(f, "Stored password hash is malformed"),
        }
    }
}

impl StdError for PasswordError {}

/// Access token (JWT) errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenError {
    SigningError(String),
    InvalidSignature,
    TokenExpired,
    MalformedSubject,
    MalformedToken,
}

impl fmt::Display for AccessTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTokenError::SigningError(msg) => write!(f, "Token signing failed: {}", msg),
            AccessTokenError::InvalidSignature => write!(f, "Token signature is invalid"),
            AccessTokenError::TokenExpired => write!(f, "Access token has expired"),
            AccessTokenError::MalformedSubject => write!(f, "Token subject is not a user id"),
            AccessTokenError::MalformedToken => write!(f, "Token is structurally invalid"),
        }
    }
}

impl StdError for AccessTokenError {}

/// Refresh token store errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTokenError {
    TokenNotFound,
    TokenRevoked,
    TokenExpired,
    StorageUnavailable(String),
}

impl fmt::Display for RefreshTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTokenError::TokenNotFound => write!(f, "Refresh token not found"),
            RefreshTokenError::TokenRevoked => write!(f, "Refresh token has been revoked"),
            RefreshTokenError::TokenExpired => write!(f, "Refresh token has expired"),
            RefreshTokenError::StorageUnavailable(msg) => {
                write!(f, "Refresh token storage unavailable: {}", msg)
            }
        }
    }
}

impl StdError for RefreshTokenError {}

impl From<DatabaseError> for RefreshTokenError {
    fn from(err: DatabaseError) -> Self {
        RefreshTokenError::StorageUnavailable(err.to_string())
    }
}

/// Authorization header parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    MissingHeader,
    MalformedHeader,
    WrongScheme,
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::MissingHeader => write!(f, "Authorization header is missing"),
            HeaderError::MalformedHeader => write!(f, "Authorization header is malformed"),
            HeaderError::WrongScheme => write!(f, "Authorization header has the wrong scheme"),
        }
    }
}

impl StdError for HeaderError {}

/// Database operation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    QueryExecution(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// SQLSTATE reported by Postgres for a unique_violation
const UNIQUE_VIOLATION: &str = "23505";

impl DatabaseError {
    /// Classify a failure reported by the database server by its SQLSTATE code
    pub fn from_sqlstate(code: Option<&str>, message: &str) -> Self {
        match code {
            Some(UNIQUE_VIOLATION) => DatabaseError::UniqueConstraintViolation(message.to_string()),
            _ => DatabaseError::QueryExecution(message.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                DatabaseError::from_sqlstate(db_err.code().as_deref(), db_err.message())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionPool(err.to_string())
            }
            _ => DatabaseError::UnexpectedError(err.to_string()),
        }
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// ============================================================================
/// 2. ORCHESTRATOR ERROR (what the HTTP layer sees)
/// ============================================================================

/// The specific check that rejected a request.
///
/// Kept for logging only; the HTTP response never reveals it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    Header(HeaderError),
    AccessToken(AccessTokenError),
    RefreshToken(RefreshTokenError),
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnauthorizedReason::Header(e) => write!(f, "{}", e),
            UnauthorizedReason::AccessToken(e) => write!(f, "{}", e),
            UnauthorizedReason::RefreshToken(e) => write!(f, "{}", e),
        }
    }
}

/// Errors returned by the authentication flows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email, wrong password and corrupt stored hash all collapse here.
    InvalidCredentials,
    Unauthorized(UnauthorizedReason),
    NotFound,
    StorageUnavailable(String),
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::Unauthorized(reason) => write!(f, "Unauthorized: {}", reason),
            AuthError::NotFound => write!(f, "Token not found"),
            AuthError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            AuthError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AuthError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<HeaderError> for AuthError {
    fn from(err: HeaderError) -> Self {
        AuthError::Unauthorized(UnauthorizedReason::Header(err))
    }
}

impl From<AccessTokenError> for AuthError {
    fn from(err: AccessTokenError) -> Self {
        match err {
            AccessTokenError::SigningError(msg) => AuthError::Internal(msg),
            other => AuthError::Unauthorized(UnauthorizedReason::AccessToken(other)),
        }
    }
}

impl From<RefreshTokenError> for AuthError {
    fn from(err: RefreshTokenError) -> Self {
        match err {
            RefreshTokenError::StorageUnavailable(msg) => AuthError::StorageUnavailable(msg),
            other => AuthError::Unauthorized(UnauthorizedReason::RefreshToken(other)),
        }
    }
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        AuthError::StorageUnavailable(err.to_string())
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses tagged with a request id
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
}

impl ErrorHandler for AuthError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Incorrect email or password",
            ),
            AuthError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing, invalid or expired token",
            ),
            AuthError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", "Token not found"),
            AuthError::StorageUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Storage temporarily unavailable",
            ),
            AuthError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            ),
        };

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message.to_string(),
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        ErrorContext::new("request").error_response(self)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Error context for log correlation across one authentication flow
///
/// The `request_id` logged for a failure is the `error_id` returned to the client.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Log `error` once and build the matching HTTP response
    pub fn error_response(&self, error: &AuthError) -> HttpResponse {
        self.log_error(error);
        let (status, body) = <AuthError as ErrorHandler>::error_response(error, &self.request_id);
        HttpResponse::build(status).json(body)
    }

    pub fn log_error(&self, error: &AuthError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        match error {
            AuthError::StorageUnavailable(_) | AuthError::Internal(_) => {
                tracing::error!(
                    error = %error,
                    context = ?context,
                    "Authentication flow failed"
                );
            }
            _ => {
                tracing::warn!(
                    error = %error,
                    context = ?context,
                    "Authentication rejected"
                );
            }
        }
    }
}
