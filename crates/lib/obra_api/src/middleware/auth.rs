//! Authentication middleware: access-token extraction and verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use obra_core::auth::permissions::{Action, Resource, has_permission};
use obra_core::models::auth::TokenClaims;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::auth::authenticate;
use crate::services::cookies::ACCESS_COOKIE;

/// Caller identity stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: TokenClaims,
    /// Role as currently stored. Authorization reads this, not the `rol`
    /// claim, so a role change applies before the token expires.
    pub role: String,
}

/// Axum middleware: reads the access token from the `auth-token` cookie (or
/// `Authorization: Bearer <token>`), verifies it, checks the user is still
/// active, and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    let token = jar
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or(bearer)
        .ok_or_else(|| AppError::Unauthorized("No autenticado".into()))?;

    let (claims, user) = authenticate(&state, &token).await?;
    request.extensions_mut().insert(AuthenticatedUser {
        claims,
        role: user.role,
    });

    Ok(next.run(request).await)
}

/// Fail with 403 unless the caller's role grants `action` on `resource`.
pub fn ensure_permission(
    user: &AuthenticatedUser,
    resource: Resource,
    action: Action,
) -> AppResult<()> {
    if has_permission(&user.role, resource, action) {
        return Ok(());
    }
    debug!(user_id = %user.claims.sub, role = %user.role, ?resource, ?action, "permission denied");
    Err(AppError::Forbidden(
        "No tienes permiso para realizar esta acción".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use obra_core::models::auth::TokenKind;

    fn user_with(claimed: &str, stored: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            claims: TokenClaims {
                sub: "u1".into(),
                email: "u1@example.com".into(),
                rol: claimed.into(),
                kind: TokenKind::Access,
                iat: 0,
                exp: i64::MAX,
                jti: "j".into(),
            },
            role: stored.into(),
        }
    }

    fn user(role: &str) -> AuthenticatedUser {
        user_with(role, role)
    }

    #[test]
    fn ensure_permission_follows_the_matrix() {
        assert!(ensure_permission(&user("admin"), Resource::Users, Action::Update).is_ok());
        assert!(matches!(
            ensure_permission(&user("vendedor"), Resource::Users, Action::Update),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn stored_role_overrides_the_claim() {
        let demoted = user_with("admin", "vendedor");
        assert!(ensure_permission(&demoted, Resource::Users, Action::Update).is_err());
        let promoted = user_with("vendedor", "admin");
        assert!(ensure_permission(&promoted, Resource::Users, Action::Update).is_ok());
    }
}
