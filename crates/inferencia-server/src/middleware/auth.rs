use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use inferencia_auth::KeyStore;
use inferencia_core::ApiError;

/// Reject requests without a known bearer credential
///
/// The accepted key is placed in request extensions for admission control
/// and copied onto the response for the canonical log line.
pub async fn authenticate(keys: Arc<KeyStore>, mut request: Request, next: Next) -> Response {
    match keys.authenticate(request.headers()) {
        Ok(key) => {
            request.extensions_mut().insert(key.clone());
            let mut response = next.run(request).await;
            response.extensions_mut().insert(key);
            response
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %request.uri().path(), "authentication failed");
            ApiError::from_error(&e).into_response()
        }
    }
}
