use std::path::PathBuf;

use inferencia_core::{ErrorKind, HttpError};

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable `Authorization: Bearer` header
    #[error("missing or malformed authorization header")]
    MissingCredential,

    /// Token is well formed but not an accepted key
    #[error("invalid API key")]
    InvalidKey,

    /// The keys file could not be read
    #[error("failed to read keys file {}: {source}", path.display())]
    KeysFile {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Neither the environment nor the keys file provided a key
    #[error("no API keys configured: set {env} or add keys to {}", path.display())]
    NoKeys {
        /// Environment variable consulted
        env: &'static str,
        /// Keys file consulted
        path: PathBuf,
    },
}

impl HttpError for AuthError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential | Self::InvalidKey => ErrorKind::Authentication,
            Self::KeysFile { .. } | Self::NoKeys { .. } => ErrorKind::Server,
        }
    }

    fn client_message(&self) -> String {
        match self {
            // malformed and unknown credentials are deliberately indistinguishable
            Self::MissingCredential | Self::InvalidKey => "Invalid or missing API key.".to_string(),
            Self::KeysFile { .. } | Self::NoKeys { .. } => "An internal error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::MissingCredential | Self::InvalidKey => Some("invalid_api_key"),
            Self::KeysFile { .. } | Self::NoKeys { .. } => None,
        }
    }
}
