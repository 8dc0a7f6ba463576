//! [`AuthStore`] over a Postgres pool.

use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthStore;
use crate::auth::{AuthError, queries};
use crate::models::auth::{AuditEvent, SessionRecord, UserRecord};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        queries::find_user_by_email(&self.pool, email).await
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, AuthError> {
        queries::find_user_by_id(&self.pool, user_id).await
    }

    async fn record_login(&self, user_id: &str) -> Result<(), AuthError> {
        queries::record_login(&self.pool, user_id).await
    }

    async fn deactivate_user(&self, email: &str) -> Result<(), AuthError> {
        queries::deactivate_user(&self.pool, email).await
    }

    async fn reset_password(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        queries::reset_password(&self.pool, user_id, password_hash).await
    }

    async fn create_session(&self, session_id: &str, user_id: &str) -> Result<(), AuthError> {
        queries::create_session(&self.pool, session_id, user_id).await
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>, AuthError> {
        queries::find_session(&self.pool, session_id).await
    }

    async fn touch_session(&self, session_id: &str) -> Result<(), AuthError> {
        queries::touch_session(&self.pool, session_id).await
    }

    async fn rotate_session(
        &self,
        old_session_id: &str,
        new_session_id: &str,
    ) -> Result<(), AuthError> {
        queries::rotate_session(&self.pool, old_session_id, new_session_id).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AuthError> {
        queries::delete_session(&self.pool, session_id).await
    }

    async fn append_audit(&self, event: AuditEvent) -> Result<(), AuthError> {
        queries::insert_audit_log(&self.pool, &event).await
    }
}
