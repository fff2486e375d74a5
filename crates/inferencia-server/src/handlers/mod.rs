pub mod chat;
pub mod embeddings;
pub mod health;
pub mod metrics;
pub mod models;

use std::{future::Future, sync::Arc, time::Instant};

use inferencia_backend::{Backend, BackendError};
use inferencia_core::{ApiError, RequestContext};
use inferencia_telemetry::metrics as telemetry;

use crate::AppState;

/// The backend serving API traffic
fn primary(state: &AppState) -> Result<Arc<dyn Backend>, ApiError> {
    state.registry.primary().map_err(|e| {
        tracing::error!(error = %e, "no backend available");
        ApiError::from_error(&e)
    })
}

/// Run one non-streaming backend call under the response deadline
///
/// Backend failures and an expired deadline both become 503 envelopes with
/// the detail logged.
async fn call<T>(
    state: &AppState,
    backend: &dyn Backend,
    context: &RequestContext,
    operation: &'static str,
    future: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, ApiError> {
    let started = Instant::now();
    let outcome = tokio::time::timeout(state.write_timeout, future).await;
    telemetry::record_backend_call(backend.name(), operation, started.elapsed());

    let request_id = context.request_id.as_ref().map(ToString::to_string).unwrap_or_default();

    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::error!(request_id = %request_id, backend = %backend.name(), operation, error = %e, "backend call failed");
            Err(ApiError::from_error(&e))
        }
        Err(_) => {
            tracing::error!(
                request_id = %request_id,
                backend = %backend.name(),
                operation,
                timeout_ms = u64::try_from(state.write_timeout.as_millis()).unwrap_or(u64::MAX),
                "response deadline exceeded"
            );
            Err(ApiError::backend_unavailable(backend.name()))
        }
    }
}
