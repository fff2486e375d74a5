use axum::{Json, extract::State};
use inferencia_backend::types::{EmbeddingRequest, EmbeddingResponse};
use inferencia_core::ApiError;

use crate::{
    AppState,
    extract::{ApiJson, Scope},
};

/// Handle `POST /v1/embeddings`
pub async fn create(
    State(state): State<AppState>,
    Scope(context): Scope,
    ApiJson(request): ApiJson<EmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    if request.input.as_ref().is_none_or(|input| input.is_empty()) {
        return Err(ApiError::invalid_request("input is required").with_param("input"));
    }

    let backend = super::primary(&state)?;
    let embeddings = super::call(
        &state,
        backend.as_ref(),
        &context,
        "create_embedding",
        backend.create_embedding(request, &context),
    )
    .await?;

    Ok(Json(embeddings))
}
