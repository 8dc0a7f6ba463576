//! API server configuration.

use std::str::FromStr;

use obra_core::auth::jwt::{resolve_jwt_secret, validate_secret};
use thiserror::Error;

/// Configuration errors. The server refuses to start on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("signing secret: {0}")]
    Secret(String),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Token, cookie and idle lifetimes. Login and refresh both read from here
/// so the JWT `exp` and the cookie `Max-Age` always agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionPolicy {
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    /// Max gap between introspections before the session is dropped.
    pub idle_timeout_secs: i64,
    /// Remaining access lifetime under which `/me` mints a fresh token.
    pub renew_threshold_secs: i64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_ttl_secs: 60 * 60,
            refresh_ttl_secs: 2 * 24 * 60 * 60,
            idle_timeout_secs: 20 * 60,
            renew_threshold_secs: 120,
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Production mode: cookies are marked `Secure`.
    pub production: bool,
    pub session: SessionPolicy,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                      | Default                            |
    /// |-------------------------------|------------------------------------|
    /// | `BIND_ADDR`                   | `127.0.0.1:3100`                   |
    /// | `DATABASE_URL`                | `postgres://localhost:5432/obra`   |
    /// | `JWT_SECRET` / `AUTH_SECRET`  | required, at least 32 bytes        |
    /// | `APP_ENV`                     | `development` (`production` → secure cookies) |
    /// | `ACCESS_TOKEN_TTL_SECS`       | `3600`                             |
    /// | `REFRESH_TOKEN_TTL_SECS`      | `172800`                           |
    /// | `SESSION_IDLE_TIMEOUT_SECS`   | `1200`                             |
    /// | `TOKEN_RENEW_THRESHOLD_SECS`  | `120`                              |
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = resolve_jwt_secret().map_err(|e| ConfigError::Secret(e.to_string()))?;
        let defaults = SessionPolicy::default();
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/obra".into()),
            jwt_secret,
            production: is_production(std::env::var("APP_ENV").ok().as_deref()),
            session: SessionPolicy {
                access_ttl_secs: env_or("ACCESS_TOKEN_TTL_SECS", defaults.access_ttl_secs)?,
                refresh_ttl_secs: env_or("REFRESH_TOKEN_TTL_SECS", defaults.refresh_ttl_secs)?,
                idle_timeout_secs: env_or(
                    "SESSION_IDLE_TIMEOUT_SECS",
                    defaults.idle_timeout_secs,
                )?,
                renew_threshold_secs: env_or(
                    "TOKEN_RENEW_THRESHOLD_SECS",
                    defaults.renew_threshold_secs,
                )?,
            },
        })
    }

    /// Build a config around an explicit secret, with defaults elsewhere.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Result<Self, ConfigError> {
        let jwt_secret = jwt_secret.into();
        validate_secret(&jwt_secret).map_err(|e| ConfigError::Secret(e.to_string()))?;
        Ok(Self {
            bind_addr: "127.0.0.1:3100".into(),
            pg_connection_url: "postgres://localhost:5432/obra".into(),
            jwt_secret,
            production: false,
            session: SessionPolicy::default(),
        })
    }
}

fn is_production(app_env: Option<&str>) -> bool {
    matches!(app_env, Some(v) if v.eq_ignore_ascii_case("production") || v.eq_ignore_ascii_case("prod"))
}

fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
