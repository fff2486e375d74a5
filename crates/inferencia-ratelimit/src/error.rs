use thiserror::Error;

/// Admission controller errors
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Invalid rate or burst, reported at startup
    #[error("rate limit configuration error: {0}")]
    Config(String),
}
