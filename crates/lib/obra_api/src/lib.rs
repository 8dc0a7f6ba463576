//! # obra_api
//!
//! HTTP API library for Obra sessions.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use chrono::Duration;
use obra_core::auth::jwt::TokenCodec;
use obra_core::auth::lockout::LockoutTracker;
use obra_core::auth::rate_limit::{RateLimitConfig, RateLimiter};
use obra_core::store::AuthStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, permissions, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User, session and audit persistence.
    pub store: Arc<dyn AuthStore>,
    /// API configuration.
    pub config: ApiConfig,
    pub tokens: Arc<TokenCodec>,
    /// Failed-login counters (this instance only).
    pub lockout: Arc<LockoutTracker>,
    pub login_limiter: Arc<RateLimiter>,
    pub refresh_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build state around a store, with a token codec whose lifetimes come
    /// from the session policy.
    pub fn new(store: Arc<dyn AuthStore>, config: ApiConfig) -> Self {
        let tokens = TokenCodec::new(
            config.jwt_secret.as_bytes(),
            Duration::seconds(config.session.access_ttl_secs),
            Duration::seconds(config.session.refresh_ttl_secs),
        );
        Self {
            store,
            config,
            tokens: Arc::new(tokens),
            lockout: Arc::new(LockoutTracker::new()),
            login_limiter: Arc::new(RateLimiter::new(RateLimitConfig::login())),
            refresh_limiter: Arc::new(RateLimiter::new(RateLimitConfig::refresh())),
        }
    }

    /// Spawn periodic eviction of stale lockout windows and rate buckets.
    pub fn spawn_cleanup_tasks(&self, ct: &CancellationToken) -> Vec<JoinHandle<()>> {
        vec![
            self.lockout.spawn_cleanup_task(ct.clone()),
            self.login_limiter.spawn_cleanup_task(ct.clone()),
            self.refresh_limiter.spawn_cleanup_task(ct.clone()),
        ]
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_API_HEALTH, get(health::health_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(
            routes::GET_AUTH_PERMISSIONS,
            get(permissions::my_permissions_handler),
        )
        .route(
            routes::POST_USERS_ID_PASSWORD,
            post(users::reset_password_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
