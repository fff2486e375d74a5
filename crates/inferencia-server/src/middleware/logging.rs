use std::{net::SocketAddr, time::Instant};

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use inferencia_core::{AuthenticatedKey, RequestId};
use tracing::Level;

use super::body::{abandoned_status, observe};

/// Target of the one-line-per-request access log
pub const ACCESS_TARGET: &str = "inferencia::access";

struct Access {
    request_id: String,
    method: String,
    path: String,
    remote_addr: String,
    user_agent: String,
    started: Instant,
}

macro_rules! access_event {
    ($level:expr, $access:expr, $status:expr, $bytes:expr, $api_key:expr, $duration_ms:expr) => {
        tracing::event!(
            target: ACCESS_TARGET,
            $level,
            request_id = %$access.request_id,
            method = %$access.method,
            path = %$access.path,
            status = $status,
            duration_ms = $duration_ms,
            bytes = $bytes,
            remote_addr = %$access.remote_addr,
            user_agent = %$access.user_agent,
            api_key = %$api_key,
            "request completed"
        )
    };
}

impl Access {
    fn from_request(request: &Request) -> Self {
        Self {
            request_id: request
                .extensions()
                .get::<RequestId>()
                .map(ToString::to_string)
                .unwrap_or_default(),
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            remote_addr: request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.to_string())
                .unwrap_or_default(),
            user_agent: request
                .headers()
                .get(http::header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string(),
            started: Instant::now(),
        }
    }

    fn emit(self, status: u16, bytes: u64, api_key: Option<&AuthenticatedKey>) {
        let duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let api_key = api_key.map(AuthenticatedKey::masked).unwrap_or_default();

        let level = level_for(status);
        if level == Level::ERROR {
            access_event!(Level::ERROR, self, status, bytes, api_key, duration_ms);
        } else if level == Level::WARN {
            access_event!(Level::WARN, self, status, bytes, api_key, duration_ms);
        } else {
            access_event!(Level::INFO, self, status, bytes, api_key, duration_ms);
        }
    }
}

/// Emits the line if the downstream future goes away without a response
struct Unfinished(Option<Access>);

impl Drop for Unfinished {
    fn drop(&mut self) {
        if let Some(access) = self.0.take() {
            access.emit(abandoned_status(), 0, None);
        }
    }
}

/// 5xx logs at error, 4xx at warn, anything else at info
pub const fn level_for(status: u16) -> Level {
    match status {
        500.. => Level::ERROR,
        400..=499 => Level::WARN,
        _ => Level::INFO,
    }
}

/// Emit exactly one canonical log line per request
///
/// The line is written once the response body has been fully sent or
/// dropped so `bytes` and `duration_ms` cover streamed responses.
pub async fn canonical(request: Request, next: Next) -> Response {
    let mut pending = Unfinished(Some(Access::from_request(&request)));

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let api_key = response.extensions().get::<AuthenticatedKey>().cloned();

    match pending.0.take() {
        Some(access) => observe(response, move |bytes| access.emit(status, bytes, api_key.as_ref())),
        None => response,
    }
}
