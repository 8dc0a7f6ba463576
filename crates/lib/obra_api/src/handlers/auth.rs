//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::{CACHE_CONTROL, PRAGMA};
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::LoginRequest;
use crate::services::auth;
use crate::services::client::ClientContext;

/// Headers that keep token-bearing responses out of caches.
const NO_STORE: [(axum::http::HeaderName, &str); 2] =
    [(CACHE_CONTROL, "no-store, max-age=0"), (PRAGMA, "no-cache")];

/// `POST /api/auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    client: ClientContext,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) =
        body.map_err(|e| AppError::Validation(format!("Cuerpo de la petición inválido: {e}")))?;
    let (jar, resp) = auth::login(&state, &client, jar, body).await?;
    Ok((NO_STORE, jar, Json(resp)))
}

/// `GET /api/auth/me`: current user, sliding the idle window.
pub async fn me_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    match auth::me(&state, jar).await {
        Ok((jar, resp)) => (NO_STORE, jar, Json(resp)).into_response(),
        Err((jar, e)) => (NO_STORE, jar, e).into_response(),
    }
}

/// `POST /api/auth/refresh`: rotate the token pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    client: ClientContext,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let (jar, resp) = auth::refresh(&state, &client, jar).await?;
    Ok((NO_STORE, jar, Json(resp)))
}

/// `POST /api/auth/logout`: clear cookies and revoke the session.
pub async fn logout_handler(
    State(state): State<AppState>,
    client: ClientContext,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, resp) = auth::logout(&state, &client, jar).await;
    (jar, Json(resp))
}
