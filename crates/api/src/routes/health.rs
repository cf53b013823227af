//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health
///
/// Answers without touching the services or their stores.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
