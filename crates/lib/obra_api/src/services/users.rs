//! Administrative user operations.

use obra_core::auth::password::{hash_password, validate_password_length};
use obra_core::auth::permissions::{Action, Resource};
use obra_core::models::auth::AuditEvent;
use tracing::info;
use uuid::Uuid;

use super::best_effort;
use super::client::ClientContext;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthenticatedUser, ensure_permission};
use crate::models::{PasswordResetRequest, PasswordResetResponse};

/// Set a new password for `user_id`. Also re-enables the account and clears
/// its lockout window, which is the only way back after a lockout.
pub async fn reset_password(
    state: &AppState,
    actor: &AuthenticatedUser,
    client: &ClientContext,
    user_id: &str,
    body: PasswordResetRequest,
) -> AppResult<PasswordResetResponse> {
    ensure_permission(actor, Resource::Users, Action::Update)?;

    let password = body
        .new_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("La nueva contraseña es obligatoria".into()))?;
    validate_password_length(password)?;

    let not_found = || AppError::NotFound("Usuario no encontrado".into());
    let user_id = Uuid::parse_str(user_id).map_err(|_| not_found())?.to_string();
    let target = state
        .store
        .find_user_by_id(&user_id)
        .await?
        .ok_or_else(not_found)?;

    let hash = hash_password(password)?;
    if !state.store.reset_password(&target.id, &hash).await? {
        return Err(not_found());
    }
    state.lockout.reset_attempts(&target.email);

    best_effort(
        "audit password reset",
        state.store.append_audit(AuditEvent {
            event_type: "password_reset".into(),
            user_id: Some(actor.claims.sub.clone()),
            email: Some(actor.claims.email.clone()),
            ip: Some(client.ip.clone()),
            user_agent: Some(client.user_agent.clone()),
            details: Some(serde_json::json!({ "targetUserId": target.id })),
        }),
    )
    .await;

    info!(actor = %actor.claims.sub, target = %target.id, "password reset");
    Ok(PasswordResetResponse {
        success: true,
        active: true,
    })
}
