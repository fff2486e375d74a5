mod harness;

use harness::config::ConfigBuilder;
use harness::mock_upstream::MockUpstream;
use harness::server::TestServer;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new().with_mlx_backend("mlx", &mock.url()).build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn readiness_probes_every_backend() {
    let first = MockUpstream::start().await.unwrap();
    let second = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_mlx_backend("first", &first.url())
        .with_mlx_backend("second", &second.url())
        .build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(first.models_count(), 1);
    assert_eq!(second.models_count(), 1);
}

#[tokio::test]
async fn readiness_names_unreachable_backend() {
    let healthy = MockUpstream::start().await.unwrap();

    // reserve a port and release it so nothing is listening there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = ConfigBuilder::new()
        .with_mlx_backend("healthy", &healthy.url())
        .with_mlx_backend("gone", &dead)
        .build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), 503);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["backend"], "gone");
    assert!(body["error"].as_str().unwrap().contains("gone"));
}

#[tokio::test]
async fn readiness_reports_unimplemented_backend() {
    let config = ConfigBuilder::new()
        .with_ollama_backend("ollama", "http://127.0.0.1:11434")
        .build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), 503);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["backend"], "ollama");
    assert!(body["error"].as_str().unwrap().contains("not implemented"));
}

#[tokio::test]
async fn health_routes_need_no_credentials() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new().with_mlx_backend("mlx", &mock.url()).build();

    let server = TestServer::start(config).await.unwrap();

    for path in ["/health", "/health/ready", "/metrics"] {
        let resp = server.client().get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 200, "{path}");
    }
}

#[tokio::test]
async fn metrics_expose_request_series() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new().with_mlx_backend("mlx", &mock.url()).build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.get("/v1/models").send().await.unwrap();
    assert_eq!(resp.status(), 200);
    resp.bytes().await.unwrap();

    let resp = server.client().get(server.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server.client().get(server.url("/metrics")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let text = resp.text().await.unwrap();
    assert!(text.contains("inferencia_http_requests_total"));
    assert!(text.contains(r#"path="/v1/models""#));
    assert!(text.contains("inferencia_backend_request_duration_seconds"));
    assert!(text.contains(r#"inferencia_backend_healthy{backend="mlx"}"#));
}
