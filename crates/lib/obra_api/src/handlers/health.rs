//! Liveness probe.

use axum::Json;

use crate::models::HealthResponse;

/// `GET /api/health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: obra_core::version().into(),
    })
}
