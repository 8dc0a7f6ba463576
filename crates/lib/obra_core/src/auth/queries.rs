//! Auth-related database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{AuditEvent, SessionRecord, UserRecord};

type UserRow = (
    String,
    String,
    String,
    String,
    bool,
    Option<DateTime<Utc>>,
);

fn user_from_row(row: UserRow) -> UserRecord {
    let (id, email, password_hash, role, active, last_login_at) = row;
    UserRecord {
        id,
        email,
        password_hash,
        role,
        active,
        last_login_at,
    }
}

/// Fetch a user by email (case-insensitive).
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id::text, email, password_hash, role, active, last_login_at \
         FROM users WHERE lower(email) = lower($1)",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(user_from_row))
}

/// Fetch a user by ID.
pub async fn find_user_by_id(pool: &PgPool, user_id: &str) -> Result<Option<UserRecord>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id::text, email, password_hash, role, active, last_login_at \
         FROM users WHERE id = $1::uuid",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(user_from_row))
}

/// Stamp `last_login_at`.
pub async fn record_login(pool: &PgPool, user_id: &str) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1::uuid")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Disable an account and clear its password timestamp so only a reset
/// brings it back.
pub async fn deactivate_user(pool: &PgPool, email: &str) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE users SET active = FALSE, password_updated_at = NULL \
         WHERE lower(email) = lower($1)",
    )
    .bind(email)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace the password hash and re-enable the account. Returns whether a
/// user was updated.
pub async fn reset_password(
    pool: &PgPool,
    user_id: &str,
    password_hash: &str,
) -> Result<bool, AuthError> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = $2, active = TRUE, password_updated_at = now() \
         WHERE id = $1::uuid",
    )
    .bind(user_id)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert a session keyed by its refresh token.
pub async fn create_session(
    pool: &PgPool,
    session_id: &str,
    user_id: &str,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO sessions (session_id, user_id, last_activity) VALUES ($1, $2::uuid, now())",
    )
    .bind(session_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Look up a session by refresh token value.
pub async fn find_session(
    pool: &PgPool,
    session_id: &str,
) -> Result<Option<SessionRecord>, AuthError> {
    let row = sqlx::query_as::<_, (String, String, DateTime<Utc>, DateTime<Utc>)>(
        "SELECT session_id, user_id::text, last_activity, created_at \
         FROM sessions WHERE session_id = $1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(
        |(session_id, user_id, last_activity, created_at)| SessionRecord {
            session_id,
            user_id,
            last_activity,
            created_at,
        },
    ))
}

/// Bump `last_activity` to now.
pub async fn touch_session(pool: &PgPool, session_id: &str) -> Result<(), AuthError> {
    sqlx::query("UPDATE sessions SET last_activity = now() WHERE session_id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Replace the session's refresh token value and bump `last_activity`.
pub async fn rotate_session(
    pool: &PgPool,
    old_session_id: &str,
    new_session_id: &str,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE sessions SET session_id = $2, last_activity = now() WHERE session_id = $1",
    )
    .bind(old_session_id)
    .bind(new_session_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a session by refresh token value.
pub async fn delete_session(pool: &PgPool, session_id: &str) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM sessions WHERE session_id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Append an audit log entry.
pub async fn insert_audit_log(pool: &PgPool, event: &AuditEvent) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO audit_log (id, event_type, user_id, email, ip, user_agent, details) \
         VALUES ($1, $2, $3::uuid, $4, $5, $6, $7)",
    )
    .bind(Uuid::now_v7())
    .bind(&event.event_type)
    .bind(event.user_id.as_deref())
    .bind(event.email.as_deref())
    .bind(event.ip.as_deref())
    .bind(event.user_agent.as_deref())
    .bind(event.details.as_ref())
    .execute(pool)
    .await?;
    Ok(())
}
