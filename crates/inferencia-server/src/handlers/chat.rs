use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use inferencia_backend::types::ChatRequest;
use inferencia_core::ApiError;

use crate::{
    AppState,
    extract::{ApiJson, Scope},
    relay,
};

/// Handle `POST /v1/chat/completions`
pub async fn completions(
    State(state): State<AppState>,
    Scope(context): Scope,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Response, ApiError> {
    if request.messages.is_empty() {
        return Err(ApiError::invalid_request("messages must not be empty").with_param("messages"));
    }

    let backend = super::primary(&state)?;

    if request.stream {
        return Ok(relay::stream(backend, request, context));
    }

    let response = super::call(
        &state,
        backend.as_ref(),
        &context,
        "chat_completion",
        backend.chat_completion(request, &context),
    )
    .await?;

    Ok(Json(response).into_response())
}
