use http::StatusCode;
use inferencia_core::{ErrorKind, HttpError};
use thiserror::Error;

use crate::SinkError;

/// Errors raised by adapters and the registry
#[derive(Debug, Error)]
pub enum BackendError {
    /// No backend registered under this name
    #[error("backend not found: {name}")]
    NotFound { name: String },

    /// Nothing has been registered yet
    #[error("no backends registered")]
    NoBackends,

    /// Connection, timeout or body transfer failure
    #[error("backend {backend}: request failed: {source}")]
    Transport {
        backend: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-2xx status
    #[error("backend {backend}: upstream returned {status}: {body}")]
    Upstream {
        backend: String,
        status: StatusCode,
        body: String,
    },

    /// Upstream body did not match the expected shape
    #[error("backend {backend}: invalid response: {message}")]
    Decode { backend: String, message: String },

    /// Event stream broke or ended before the terminal sentinel
    #[error("backend {backend}: stream error: {message}")]
    Stream { backend: String, message: String },

    /// The adapter does not support this operation yet
    #[error("backend {backend}: {operation} is not implemented")]
    NotImplemented {
        backend: String,
        operation: &'static str,
    },

    /// The caller stopped the call (client gone or sink refused a chunk)
    #[error("backend {backend}: aborted: {reason}")]
    Aborted { backend: String, reason: SinkError },
}

impl BackendError {
    /// Name of the backend involved
    pub fn backend(&self) -> &str {
        match self {
            Self::NotFound { name } => name,
            Self::NoBackends => "primary",
            Self::Transport { backend, .. }
            | Self::Upstream { backend, .. }
            | Self::Decode { backend, .. }
            | Self::Stream { backend, .. }
            | Self::NotImplemented { backend, .. }
            | Self::Aborted { backend, .. } => backend,
        }
    }

    /// Whether the failure came from the caller rather than the engine
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

impl HttpError for BackendError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Backend
    }

    fn client_message(&self) -> String {
        format!("Backend {} is currently unavailable.", self.backend())
    }

    fn error_code(&self) -> Option<&'static str> {
        Some("backend_unavailable")
    }
}
