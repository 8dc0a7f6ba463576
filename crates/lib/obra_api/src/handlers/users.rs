//! User administration handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{PasswordResetRequest, PasswordResetResponse};
use crate::services::client::ClientContext;
use crate::services::users;

/// `POST /api/users/{id}/password`: set a new password and re-enable the
/// account. Requires `users:update`.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    client: ClientContext,
    Path(user_id): Path<String>,
    body: Result<Json<PasswordResetRequest>, JsonRejection>,
) -> AppResult<Json<PasswordResetResponse>> {
    let Json(body) =
        body.map_err(|e| AppError::Validation(format!("Cuerpo de la petición inválido: {e}")))?;
    let resp = users::reset_password(&state, &actor, &client, &user_id, body).await?;
    Ok(Json(resp))
}
