use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use http::header;

use crate::AppState;

/// Handle `GET /metrics`
pub async fn render(State(state): State<AppState>) -> Response {
    let body = inferencia_telemetry::metrics::render(&state.metrics);
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
}
