use axum::{extract::Request, middleware::Next, response::Response};
use http::HeaderValue;
use inferencia_core::{REQUEST_ID_HEADER, RequestId};

/// Tag the request with a correlation id and echo it on the response
///
/// A non-empty client supplied `X-Request-ID` is reused as is.
pub async fn tag(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(RequestId::generate, |value| RequestId::from(value.to_string()));

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Router, body::Body, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/", get(|Extension(id): Extension<RequestId>| async move { id.to_string() }))
            .layer(axum::middleware::from_fn(tag))
    }

    #[tokio::test]
    async fn reuses_client_supplied_id() {
        let response = app()
            .oneshot(
                http::Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, "trace-abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-abc-123");
    }

    #[tokio::test]
    async fn generates_id_when_absent_or_blank() {
        for supplied in [None, Some("   ")] {
            let mut builder = http::Request::builder().uri("/");
            if let Some(value) = supplied {
                builder = builder.header(REQUEST_ID_HEADER, value);
            }

            let response = app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
            let echoed = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
            assert_eq!(echoed.len(), 32);

            let body = http_body_util::BodyExt::collect(response.into_body()).await.unwrap().to_bytes();
            assert_eq!(body, echoed.as_bytes());
        }
    }
}
