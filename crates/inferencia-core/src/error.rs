use std::fmt;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;

/// Error classes exposed to API consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed body or missing required field
    InvalidRequest,
    /// Body larger than the configured limit
    PayloadTooLarge,
    /// Missing or unknown credential
    Authentication,
    /// Admission denied
    RateLimit,
    /// Upstream unreachable, failing, or not implemented
    Backend,
    /// Unexpected fault, including recovered panics
    Server,
}

impl ErrorKind {
    /// Wire value of the envelope `type` field
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest | Self::PayloadTooLarge => "invalid_request_error",
            Self::Authentication => "authentication_error",
            Self::RateLimit => "rate_limit_error",
            Self::Backend => "backend_error",
            Self::Server => "server_error",
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            Self::Backend => StatusCode::SERVICE_UNAVAILABLE,
            Self::Server => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type. The server layer turns
/// these into [`ApiError`] envelopes, keeping domain crates free of
/// response construction.
pub trait HttpError: std::error::Error {
    /// Error class, which also fixes the status code
    fn kind(&self) -> ErrorKind;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// Machine-readable code (e.g. `invalid_api_key`)
    fn error_code(&self) -> Option<&'static str> {
        None
    }

    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        self.kind().status()
    }
}

/// The single JSON error envelope returned for every non-2xx response
///
/// Serializes as `{"error": {"message", "type", "code"?, "param"?}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    code: Option<String>,
    param: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            param: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            ErrorKind::PayloadTooLarge,
            format!("Request body exceeds the {limit} byte limit."),
        )
        .with_code("request_too_large")
    }

    pub fn authentication() -> Self {
        Self::new(ErrorKind::Authentication, "Invalid or missing API key.").with_code("invalid_api_key")
    }

    pub fn rate_limited() -> Self {
        Self::new(
            ErrorKind::RateLimit,
            "Rate limit exceeded. Please retry after a brief wait.",
        )
        .with_code("rate_limit_exceeded")
    }

    pub fn backend_unavailable(backend: &str) -> Self {
        Self::new(ErrorKind::Backend, format!("Backend {backend} is currently unavailable."))
            .with_code("backend_unavailable")
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Server, "An internal error occurred.")
    }

    /// Build the envelope for a domain error
    pub fn from_error(error: &dyn HttpError) -> Self {
        let envelope = Self::new(error.kind(), error.client_message());
        match error.error_code() {
            Some(code) => envelope.with_code(code),
            None => envelope,
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub const fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct Envelope<'a> {
    error: Detail<'a>,
}

#[derive(Serialize)]
struct Detail<'a> {
    message: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    param: Option<&'a str>,
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Envelope {
            error: Detail {
                message: &self.message,
                kind: self.kind.as_str(),
                code: self.code.as_deref(),
                param: self.param.as_deref(),
            },
        }
        .serialize(serializer)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
