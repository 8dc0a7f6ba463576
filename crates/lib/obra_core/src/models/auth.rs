//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! shapes in `obra_api::models` (which use camelCase on the wire).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted user row, as seen by the session subsystem.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    /// Raw role string (`dueño`, `admin`, `vendedor`, `cliente`, `demo`).
    pub role: String,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// One row per issued refresh token.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// The current refresh token value. Rotated on every refresh.
    pub session_id: String,
    pub user_id: String,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Free-form audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: String,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    /// Start an event of the given type with no other fields set.
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            user_id: None,
            email: None,
            ip: None,
            user_agent: None,
            details: None,
        }
    }
}

/// Token type discriminator, carried as the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: user ID (standard JWT `sub` claim).
    pub sub: String,
    /// User email.
    pub email: String,
    /// User role.
    pub rol: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}
