use axum::{Json, extract::State};
use inferencia_backend::types::ModelList;
use inferencia_core::ApiError;

use crate::{AppState, extract::Scope};

/// Handle `GET /v1/models`
pub async fn list(State(state): State<AppState>, Scope(context): Scope) -> Result<Json<ModelList>, ApiError> {
    let backend = super::primary(&state)?;
    let models = super::call(&state, backend.as_ref(), &context, "list_models", backend.list_models(&context)).await?;
    Ok(Json(models))
}
