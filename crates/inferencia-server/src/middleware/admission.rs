use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, HeaderValue, header::RETRY_AFTER};
use inferencia_core::{ApiError, AuthenticatedKey};
use inferencia_ratelimit::AdmissionController;
use inferencia_telemetry::metrics as telemetry;

pub const RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Seconds a throttled client is told to wait
const RETRY_AFTER_SECONDS: &str = "1";

fn disclose(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
}

/// Token-bucket admission keyed by the authenticated credential
///
/// Requests that reach this point without a credential pass unthrottled.
pub async fn admit(limiter: Arc<AdmissionController>, request: Request, next: Next) -> Response {
    let Some(key) = request.extensions().get::<AuthenticatedKey>() else {
        return next.run(request).await;
    };

    let admission = limiter.allow(key.expose());
    let limit = limiter.burst();

    if !admission.permitted {
        telemetry::record_rate_limit_rejection();
        tracing::warn!(api_key = %key.masked(), limit, "rate limit exceeded");

        let mut response = ApiError::rate_limited().into_response();
        disclose(response.headers_mut(), limit, 0);
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECONDS));
        return response;
    }

    let mut response = next.run(request).await;
    disclose(response.headers_mut(), limit, admission.remaining);
    response
}
