#![allow(clippy::must_use_candidate)]
//! Uniform OpenAI-shaped request model and the adapters that translate it
//! to upstream inference engines

mod backend;
mod error;
pub mod mlx;
pub mod ollama;
mod registry;
pub mod types;

pub use backend::{Backend, ChunkSink, DONE_SENTINEL, SinkError};
pub use error::BackendError;
pub use mlx::MlxBackend;
pub use ollama::OllamaBackend;
pub use registry::Registry;

use std::sync::Arc;

use inferencia_config::{BackendConfig, BackendKind};

/// Build the adapter for one configured backend
///
/// # Errors
///
/// Returns an error if the HTTP client for the adapter cannot be built
pub fn from_config(config: &BackendConfig) -> Result<Arc<dyn Backend>, BackendError> {
    match config.kind {
        BackendKind::Mlx => Ok(Arc::new(MlxBackend::new(
            config.name.clone(),
            config.url.clone(),
            config.timeout,
        )?)),
        BackendKind::Ollama => Ok(Arc::new(OllamaBackend::new(config.name.clone(), config.url.clone()))),
    }
}
