//! Authentication and authorization logic.
//!
//! Provides the token codec, password hashing, in-process abuse protection
//! (lockout and rate limiting), the role permission matrix, and the database
//! queries backing the Postgres session store.

pub mod fingerprint;
pub mod jwt;
pub mod lockout;
pub mod password;
pub mod permissions;
pub mod queries;
pub mod rate_limit;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
