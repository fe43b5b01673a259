//! Health check endpoint.

use axum::Json;
use common::HealthCheckResponse;

/// GET /health: `CheckHealth()`. Answering at all is the proof of liveness.
pub async fn check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse::alive())
}
