use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use inferencia_telemetry::metrics as telemetry;

use super::body::{abandoned_status, observe};

struct Labels {
    method: String,
    path: String,
    started: Instant,
}

impl Labels {
    fn record(self, status: u16) {
        telemetry::record_http_request(&self.method, &self.path, status, self.started.elapsed());
        telemetry::request_finished();
    }
}

/// Records the request if the downstream future goes away without a response
struct Unfinished(Option<Labels>);

impl Drop for Unfinished {
    fn drop(&mut self) {
        if let Some(labels) = self.0.take() {
            labels.record(abandoned_status());
        }
    }
}

/// Count and time every request, including streamed bodies to their end
pub async fn capture(request: Request, next: Next) -> Response {
    telemetry::request_started();

    let mut pending = Unfinished(Some(Labels {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        started: Instant::now(),
    }));

    let response = next.run(request).await;
    let status = response.status().as_u16();

    match pending.0.take() {
        Some(labels) => observe(response, move |_| labels.record(status)),
        None => response,
    }
}
