use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use inferencia_telemetry::metrics as telemetry;
use serde_json::json;

use crate::AppState;

/// Handle `GET /health`, liveness only
pub async fn live() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Handle `GET /health/ready`
///
/// Probes backends in registration order and reports the first failure.
pub async fn ready(State(state): State<AppState>) -> Response {
    for backend in state.registry.all() {
        let result = backend.health().await;
        telemetry::set_backend_health(backend.name(), result.is_ok());

        if let Err(e) = result {
            tracing::warn!(backend = %backend.name(), error = %e, "backend not ready");
            let body = json!({
                "status": "unavailable",
                "backend": backend.name(),
                "error": e.to_string(),
            });
            return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
        }
    }

    Json(json!({ "status": "ready" })).into_response()
}
