use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

/// Header carrying the correlation identifier in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation identifier for one request
///
/// Reused from the client when supplied, otherwise freshly generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate an unpredictable identifier (UUID v4, 32 hex characters)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The bearer credential that passed authentication
///
/// Placed in request extensions by the auth middleware and read by
/// admission control and the canonical log line.
#[derive(Clone)]
pub struct AuthenticatedKey(SecretString);

impl AuthenticatedKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Raw credential, used as the admission-control key
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Loggable form keeping only the last 8 characters
    pub fn masked(&self) -> String {
        mask_key(self.expose())
    }
}

impl fmt::Debug for AuthenticatedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthenticatedKey").field(&self.masked()).finish()
    }
}

/// Mask a credential for logs: `***` when 8 characters or fewer,
/// otherwise `...` followed by the last 8 characters
pub fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 8 {
        return "***".to_string();
    }
    let tail: String = key.chars().skip(count - 8).collect();
    format!("...{tail}")
}

/// Runtime context handed to backend calls
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Correlation identifier forwarded upstream
    pub request_id: Option<RequestId>,
    /// Fires when the inbound request is abandoned
    pub cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(request_id: Option<RequestId>) -> Self {
        Self {
            request_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a context with no correlation id, used by health probes
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
