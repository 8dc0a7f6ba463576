//! Session flows: login, introspection, refresh rotation and logout.

use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use obra_core::auth::fingerprint::{fingerprint_matches, ua_fingerprint};
use obra_core::auth::jwt::{TokenSubject, remaining_secs};
use obra_core::auth::password::{validate_password_length, verify_dummy, verify_password};
use obra_core::models::auth::{AuditEvent, TokenClaims, TokenKind, UserRecord};
use tracing::{debug, info, warn};

use super::best_effort;
use super::client::ClientContext;
use super::cookies::{
    ACCESS_COOKIE, REFRESH_COOKIE, UA_COOKIE, access_cookie, clear_access_cookie,
    clear_refresh_cookie, clear_ua_cookie, refresh_cookie, ua_cookie,
};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthUser, LoginRequest, LoginResponse, LogoutResponse, MeResponse, RefreshResponse,
};

fn cookie_value<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name).map(|c| c.value()).filter(|v| !v.is_empty())
}

fn subject_of(user: &UserRecord) -> TokenSubject {
    TokenSubject {
        id: user.id.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
    }
}

/// Register a credential failure and pick the response for it.
async fn failed_attempt(state: &AppState, email: &str) -> AppError {
    let outcome = state.lockout.register_failed_attempt(email);
    if outcome.deactivated {
        best_effort("deactivate user", state.store.deactivate_user(email)).await;
        return AppError::Deactivated(
            "La cuenta fue desactivada por demasiados intentos fallidos. \
             Restablece tu contraseña para recuperar el acceso"
                .into(),
        );
    }
    AppError::InvalidCredentials {
        warning: outcome.warning(),
    }
}

/// Authenticate with email + password and open a session.
pub async fn login(
    state: &AppState,
    client: &ClientContext,
    jar: CookieJar,
    body: LoginRequest,
) -> AppResult<(CookieJar, LoginResponse)> {
    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let password = body.password.as_deref().filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::Validation(
            "Email y contraseña son obligatorios".into(),
        ));
    };
    validate_password_length(password)?;
    let email = email.to_lowercase();

    if !state.login_limiter.allow(&client.rate_key(Some(&email))) {
        warn!(email = %email, ip = %client.ip, "login rate limited");
        return Err(AppError::TooManyRequests(
            "Demasiados intentos. Espera un minuto e inténtalo de nuevo".into(),
        ));
    }

    let user = match state.store.find_user_by_email(&email).await? {
        Some(user) if user.active => user,
        Some(_) => {
            verify_dummy(password);
            warn!(email = %email, "login rejected: account inactive");
            return Err(failed_attempt(state, &email).await);
        }
        None => {
            verify_dummy(password);
            warn!(email = %email, "login rejected: unknown email");
            return Err(failed_attempt(state, &email).await);
        }
    };

    let lock = state.lockout.is_temporarily_locked(&email);
    if lock.locked {
        warn!(email = %email, locked_until = ?lock.locked_until, "login rejected: account locked");
        return Err(AppError::TooManyRequests(
            "La cuenta está bloqueada por demasiados intentos fallidos".into(),
        ));
    }

    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login rejected: wrong password");
        return Err(failed_attempt(state, &email).await);
    }

    let subject = subject_of(&user);
    let access = state.tokens.sign_access(&subject)?;
    let refresh = state.tokens.sign_refresh(&subject)?;

    state.store.record_login(&user.id).await?;
    state.store.create_session(&refresh, &user.id).await?;
    best_effort(
        "audit login",
        state.store.append_audit(AuditEvent {
            event_type: "login".into(),
            user_id: Some(user.id.clone()),
            email: Some(user.email.clone()),
            ip: Some(client.ip.clone()),
            user_agent: Some(client.user_agent.clone()),
            details: None,
        }),
    )
    .await;
    state.lockout.reset_attempts(&email);

    let policy = state.config.session;
    let secure = state.config.production;
    let jar = jar
        .add(access_cookie(&access, policy.access_ttl_secs, secure))
        .add(refresh_cookie(&refresh, policy.refresh_ttl_secs, secure))
        .add(ua_cookie(
            &ua_fingerprint(&client.user_agent),
            policy.refresh_ttl_secs,
            secure,
        ));

    info!(user_id = %user.id, role = %user.role, "login succeeded");

    let mut user = AuthUser::from(&user);
    user.last_login_at = Some(Utc::now());
    Ok((
        jar,
        LoginResponse {
            user,
            expires_in: policy.access_ttl_secs,
        },
    ))
}

/// Verify the access cookie and load the (still active) user behind it.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<(TokenClaims, UserRecord)> {
    let claims = state
        .tokens
        .verify_kind(token, TokenKind::Access)
        .map_err(|e| {
            debug!(error = %e, "access token rejected");
            AppError::Unauthorized("Token inválido o expirado".into())
        })?;
    let user = state
        .store
        .find_user_by_id(&claims.sub)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| AppError::Unauthorized("Usuario inactivo o inexistente".into()))?;
    Ok((claims, user))
}

enum SessionCheck {
    Live,
    Missing,
    Idle,
}

/// Validate the idle window of the session behind `refresh` and slide it.
async fn check_session(
    state: &AppState,
    refresh: &str,
    user_id: &str,
) -> AppResult<SessionCheck> {
    let Some(session) = state.store.find_session(refresh).await? else {
        return Ok(SessionCheck::Missing);
    };
    if session.user_id != user_id {
        return Ok(SessionCheck::Missing);
    }
    let idle = Utc::now() - session.last_activity;
    if idle > Duration::seconds(state.config.session.idle_timeout_secs) {
        best_effort("delete idle session", state.store.delete_session(refresh)).await;
        info!(user_id, idle_secs = idle.num_seconds(), "session expired by inactivity");
        return Ok(SessionCheck::Idle);
    }
    state.store.touch_session(refresh).await?;
    Ok(SessionCheck::Live)
}

/// Introspect the current session.
///
/// On a missing or idle session the returned jar clears the stale cookies.
/// When the access token is close to expiry a fresh one is set, while the
/// current claims still answer this request.
pub async fn me(
    state: &AppState,
    jar: CookieJar,
) -> Result<(CookieJar, MeResponse), (CookieJar, AppError)> {
    let secure = state.config.production;
    let Some(token) = cookie_value(&jar, ACCESS_COOKIE).map(str::to_string) else {
        return Err((jar, AppError::Unauthorized("No autenticado".into())));
    };
    let (claims, user) = match authenticate(state, &token).await {
        Ok(found) => found,
        Err(e) => return Err((jar, e)),
    };

    if let Some(refresh) = cookie_value(&jar, REFRESH_COOKIE).map(str::to_string) {
        match check_session(state, &refresh, &user.id).await {
            Ok(SessionCheck::Live) => {}
            Ok(SessionCheck::Missing) => {
                let jar = jar.add(clear_refresh_cookie(secure));
                return Err((jar, AppError::Unauthorized("Sesión no encontrada".into())));
            }
            Ok(SessionCheck::Idle) => {
                let jar = jar
                    .add(clear_access_cookie(secure))
                    .add(clear_refresh_cookie(secure))
                    .add(clear_ua_cookie(secure));
                return Err((
                    jar,
                    AppError::Unauthorized("Sesión expirada por inactividad".into()),
                ));
            }
            Err(e) => return Err((jar, e)),
        }
    }

    let policy = state.config.session;
    let jar = if remaining_secs(&claims) < policy.renew_threshold_secs {
        match state.tokens.sign_access(&subject_of(&user)) {
            Ok(fresh) => {
                debug!(user_id = %user.id, "access token renewed");
                jar.add(access_cookie(&fresh, policy.access_ttl_secs, secure))
            }
            Err(e) => {
                warn!(error = %e, "silent access token renewal failed");
                jar
            }
        }
    } else {
        jar
    };

    Ok((
        jar,
        MeResponse {
            user: AuthUser::from(&user),
        },
    ))
}

/// Exchange the refresh cookie for a new token pair bound to the same browser.
pub async fn refresh(
    state: &AppState,
    client: &ClientContext,
    jar: CookieJar,
) -> AppResult<(CookieJar, RefreshResponse)> {
    let token = cookie_value(&jar, REFRESH_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("Sin token de refresco".into()))?
        .to_string();

    if !state.refresh_limiter.allow(&client.rate_key(None)) {
        warn!(ip = %client.ip, "refresh rate limited");
        return Err(AppError::TooManyRequests(
            "Demasiadas renovaciones. Espera un minuto".into(),
        ));
    }

    let claims = state
        .tokens
        .verify_kind(&token, TokenKind::Refresh)
        .map_err(|e| {
            debug!(error = %e, "refresh token rejected");
            AppError::Unauthorized("Token de refresco inválido o expirado".into())
        })?;

    if !fingerprint_matches(cookie_value(&jar, UA_COOKIE), &client.user_agent) {
        warn!(user_id = %claims.sub, ip = %client.ip, "refresh rejected: user agent mismatch");
        return Err(AppError::Unauthorized(
            "El token de refresco no corresponde a este navegador".into(),
        ));
    }

    let session = state
        .store
        .find_session(&token)
        .await?
        .filter(|s| s.user_id == claims.sub)
        .ok_or_else(|| AppError::Unauthorized("Sesión revocada".into()))?;

    let idle = Utc::now() - session.last_activity;
    if idle > Duration::seconds(state.config.session.idle_timeout_secs) {
        best_effort("delete idle session", state.store.delete_session(&token)).await;
        info!(
            user_id = %session.user_id,
            idle_secs = idle.num_seconds(),
            "refresh rejected: session idle"
        );
        return Err(AppError::Unauthorized(
            "Sesión expirada por inactividad".into(),
        ));
    }

    let user = state
        .store
        .find_user_by_id(&session.user_id)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| AppError::Unauthorized("Usuario inactivo o inexistente".into()))?;

    best_effort("touch session", state.store.touch_session(&token)).await;

    let subject = subject_of(&user);
    let access = state.tokens.sign_access(&subject)?;
    let new_refresh = state.tokens.sign_refresh(&subject)?;

    best_effort(
        "rotate session",
        state.store.rotate_session(&token, &new_refresh),
    )
    .await;

    let policy = state.config.session;
    let secure = state.config.production;
    let jar = jar
        .add(access_cookie(&access, policy.access_ttl_secs, secure))
        .add(refresh_cookie(&new_refresh, policy.refresh_ttl_secs, secure))
        .add(ua_cookie(
            &ua_fingerprint(&client.user_agent),
            policy.refresh_ttl_secs,
            secure,
        ));

    debug!(user_id = %user.id, "session rotated");
    Ok((
        jar,
        RefreshResponse {
            success: true,
            expires_in: policy.access_ttl_secs,
        },
    ))
}

/// Clear the session cookies and drop the server-side session.
pub async fn logout(
    state: &AppState,
    client: &ClientContext,
    jar: CookieJar,
) -> (CookieJar, LogoutResponse) {
    if let Some(refresh) = cookie_value(&jar, REFRESH_COOKIE) {
        best_effort("delete session", state.store.delete_session(refresh)).await;
    }

    let user = cookie_value(&jar, ACCESS_COOKIE).and_then(|t| state.tokens.verify(t).ok());
    if let Some(claims) = &user {
        best_effort(
            "audit logout",
            state.store.append_audit(AuditEvent {
                event_type: "logout".into(),
                user_id: Some(claims.sub.clone()),
                email: Some(claims.email.clone()),
                ip: Some(client.ip.clone()),
                user_agent: Some(client.user_agent.clone()),
                details: None,
            }),
        )
        .await;
        info!(user_id = %claims.sub, "logout");
    }

    let secure = state.config.production;
    let jar = jar
        .add(clear_access_cookie(secure))
        .add(clear_refresh_cookie(secure))
        .add(clear_ua_cookie(secure));
    (jar, LogoutResponse { success: true })
}
