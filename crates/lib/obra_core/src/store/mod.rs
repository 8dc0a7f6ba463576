//! Persistence seam for the session subsystem.
//!
//! Handlers depend on [`AuthStore`] rather than a pool so the same flows run
//! against Postgres in production and an in-memory map in tests.

mod memory;
mod postgres;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::auth::AuthError;
use crate::models::auth::{AuditEvent, SessionRecord, UserRecord};

/// User, session and audit persistence.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, AuthError>;

    /// Stamp `last_login_at` with the current time.
    async fn record_login(&self, user_id: &str) -> Result<(), AuthError>;

    /// Set `active = false` for the account with this email, if any.
    async fn deactivate_user(&self, email: &str) -> Result<(), AuthError>;

    /// Store a new password hash and re-enable the account.
    /// Returns `false` when the user does not exist.
    async fn reset_password(&self, user_id: &str, password_hash: &str)
    -> Result<bool, AuthError>;

    async fn create_session(&self, session_id: &str, user_id: &str) -> Result<(), AuthError>;

    async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>, AuthError>;

    /// Bump `last_activity` to now.
    async fn touch_session(&self, session_id: &str) -> Result<(), AuthError>;

    /// Move a session to a new refresh token value and bump `last_activity`.
    async fn rotate_session(&self, old_session_id: &str, new_session_id: &str)
    -> Result<(), AuthError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), AuthError>;

    async fn append_audit(&self, event: AuditEvent) -> Result<(), AuthError>;
}
