use crate::api::responses::HealthResponse;
use axum::Json;

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
