//! Prometheus metrics
//!
//! Series exposed on `/metrics`:
//! - `inferencia_http_requests_total{method,path,status}`
//! - `inferencia_http_request_duration_seconds{method,path}`
//! - `inferencia_http_requests_in_flight`
//! - `inferencia_ratelimit_rejections_total`
//! - `inferencia_backend_request_duration_seconds{backend,operation}`
//! - `inferencia_backend_healthy{backend}`

use std::{sync::OnceLock, time::Duration};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const HTTP_REQUESTS_TOTAL: &str = "inferencia_http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "inferencia_http_request_duration_seconds";
pub const HTTP_REQUESTS_IN_FLIGHT: &str = "inferencia_http_requests_in_flight";
pub const RATELIMIT_REJECTIONS_TOTAL: &str = "inferencia_ratelimit_rejections_total";
pub const BACKEND_REQUEST_DURATION: &str = "inferencia_backend_request_duration_seconds";
pub const BACKEND_HEALTHY: &str = "inferencia_backend_healthy";

/// Path label for anything outside the known routes
pub const OTHER_PATH: &str = "/other";

const KNOWN_PATHS: [&str; 6] = [
    "/v1/chat/completions",
    "/v1/models",
    "/v1/embeddings",
    "/health",
    "/health/ready",
    "/metrics",
];

/// Inference latency is bimodal: sub-second for cached or short prompts,
/// tens of seconds for long generations
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.025, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

static HANDLE: OnceLock<Result<PrometheusHandle, String>> = OnceLock::new();

/// Install the process-wide Prometheus recorder
///
/// Idempotent: later calls return the handle of the first successful install.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed
pub fn install() -> anyhow::Result<PrometheusHandle> {
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new()
                .set_buckets(LATENCY_BUCKETS)
                .map_err(|e| format!("invalid histogram buckets: {e}"))?
                .build_recorder();
            let handle = recorder.handle();

            metrics::set_global_recorder(recorder)
                .map_err(|_| "a global metrics recorder is already installed".to_string())?;

            describe();
            Ok(handle)
        })
        .clone()
        .map_err(anyhow::Error::msg)
}

fn describe() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests by method, path and status");
    describe_histogram!(HTTP_REQUEST_DURATION, "HTTP request duration in seconds");
    describe_gauge!(HTTP_REQUESTS_IN_FLIGHT, "HTTP requests currently being served");
    describe_counter!(RATELIMIT_REJECTIONS_TOTAL, "Requests rejected by admission control");
    describe_histogram!(BACKEND_REQUEST_DURATION, "Backend call duration in seconds");
    describe_gauge!(BACKEND_HEALTHY, "Last readiness probe result per backend, 1 healthy");
}

/// Render the exposition text
pub fn render(handle: &PrometheusHandle) -> String {
    handle.run_upkeep();
    handle.render()
}

/// Collapse a request path onto a bounded label set
pub fn normalize_path(path: &str) -> &'static str {
    KNOWN_PATHS.into_iter().find(|known| *known == path).unwrap_or(OTHER_PATH)
}

/// Count a finished request
pub fn record_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let path = normalize_path(path);

    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path,
        "status" => status.to_string(),
    )
    .increment(1);

    histogram!(HTTP_REQUEST_DURATION, "method" => method.to_string(), "path" => path).record(elapsed.as_secs_f64());
}

pub fn request_started() {
    gauge!(HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
}

pub fn request_finished() {
    gauge!(HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);
}

pub fn record_rate_limit_rejection() {
    counter!(RATELIMIT_REJECTIONS_TOTAL).increment(1);
}

pub fn record_backend_call(backend: &str, operation: &'static str, elapsed: Duration) {
    histogram!(
        BACKEND_REQUEST_DURATION,
        "backend" => backend.to_string(),
        "operation" => operation,
    )
    .record(elapsed.as_secs_f64());
}

pub fn set_backend_health(backend: &str, healthy: bool) {
    gauge!(BACKEND_HEALTHY, "backend" => backend.to_string()).set(if healthy { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_paths_keep_their_label() {
        assert_eq!(normalize_path("/v1/chat/completions"), "/v1/chat/completions");
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
        assert_eq!(normalize_path("/metrics"), "/metrics");
    }

    #[test]
    fn unknown_paths_collapse() {
        assert_eq!(normalize_path("/v1/models/llama"), OTHER_PATH);
        assert_eq!(normalize_path("/admin"), OTHER_PATH);
        assert_eq!(normalize_path(""), OTHER_PATH);
    }

    #[test]
    fn install_is_idempotent_and_renders_series() {
        let first = install().unwrap();
        let second = install().unwrap();

        record_http_request("GET", "/v1/models", 200, Duration::from_millis(12));
        record_rate_limit_rejection();

        let text = render(&second);
        assert!(text.contains(HTTP_REQUESTS_TOTAL));
        assert!(text.contains(r#"path="/v1/models""#));
        assert!(text.contains(RATELIMIT_REJECTIONS_TOTAL));
        assert!(render(&first).contains(HTTP_REQUESTS_TOTAL));
    }
}
