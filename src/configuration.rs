use std::fmt;

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Symmetric key used to sign access tokens.
///
/// Loaded once at startup. `Debug` is redacted so the value never reaches the logs.
#[derive(serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

/// Longest lifetime accepted for either token kind (10 years)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 3600;

fn default_access_token_ttl() -> i64 {
    3600
}

fn default_refresh_token_ttl() -> i64 {
    60 * 24 * 3600
}

/// Token signing and lifetime settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct AuthSettings {
    pub secret: SigningSecret,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_seconds: i64,   // 1 hour
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_seconds: i64,  // 60 days
}

impl AuthSettings {
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            access_token_ttl_seconds: default_access_token_ttl(),
            refresh_token_ttl_seconds: default_refresh_token_ttl(),
        }
    }

    // Values outside (0, MAX_TOKEN_TTL_SECONDS] are rejected by `validate`.
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_ttl_seconds.clamp(0, MAX_TOKEN_TTL_SECONDS))
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_ttl_seconds.clamp(0, MAX_TOKEN_TTL_SECONDS))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingRequired("auth.secret".to_string()));
        }
        check_ttl("auth.access_token_ttl_seconds", self.access_token_ttl_seconds)?;
        check_ttl("auth.refresh_token_ttl_seconds", self.refresh_token_ttl_seconds)?;
        Ok(())
    }
}

fn check_ttl(key: &str, seconds: i64) -> Result<(), ConfigError> {
    if seconds <= 0 {
        return Err(ConfigError::InvalidValue(format!("{} must be positive", key)));
    }
    if seconds > MAX_TOKEN_TTL_SECONDS {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be at most {} seconds",
            key, MAX_TOKEN_TTL_SECONDS
        )));
    }
    Ok(())
}

/// Load settings from `configuration.*` and `APP_`-prefixed environment variables.
///
/// The secret is normally supplied as `APP_AUTH__SECRET`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
