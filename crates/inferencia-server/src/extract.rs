use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
};
use bytes::Bytes;
use inferencia_core::{ApiError, RequestContext, RequestId};
use serde::de::DeserializeOwned;

use crate::AppState;

/// JSON body whose failures use the error envelope
///
/// The body is read under the configured read timeout. A body over the
/// configured size limit is rejected with 413 before any parsing.
pub struct ApiJson<T>(pub T);

impl<T> FromRequest<AppState> for ApiJson<T>
where
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let bytes = tokio::time::timeout(state.read_timeout, Bytes::from_request(request, state))
            .await
            .map_err(|_| ApiError::invalid_request("Timed out reading request body"))?
            .map_err(|rejection| {
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApiError::payload_too_large(state.max_body_size)
                } else {
                    ApiError::invalid_request(format!("Failed to read request body: {}", rejection.body_text()))
                }
            })?;

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON in request body: {e}")))
    }
}

/// Per-request backend context carrying the correlation id
pub struct Scope(pub RequestContext);

impl<S> FromRequestParts<S> for Scope
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts.extensions.get::<RequestId>().cloned();
        Ok(Self(RequestContext::new(request_id)))
    }
}
