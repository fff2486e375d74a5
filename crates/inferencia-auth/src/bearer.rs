use http::{HeaderMap, header::AUTHORIZATION};

use crate::AuthError;

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// A missing header, a non-`Bearer ` scheme, and an empty token are all
/// the same failure.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingCredential)
}
