//! Test server wrapper that starts Inferencia on a random port

use std::net::SocketAddr;

use inferencia_auth::KeyStore;
use inferencia_backend::Registry;
use inferencia_config::Config;
use inferencia_server::Server;
use tokio_util::sync::CancellationToken;

use super::{OTHER_KEY, TEST_KEY};

/// Gateway serving on an ephemeral port
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a test server with adapters built from `config`
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let registry = inferencia_server::build_registry(&config)?;
        Self::start_with_registry(config, registry).await
    }

    /// Start a test server around a prepared registry
    ///
    /// Binds `127.0.0.1:0` and serves the real router
    pub async fn start_with_registry(config: Config, registry: Registry) -> anyhow::Result<Self> {
        let keys = KeyStore::from_keys([TEST_KEY, OTHER_KEY]);
        let server = Server::with_parts(&config, registry, keys)?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(
                listener,
                server.into_router().into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                shutdown_clone.cancelled().await;
            })
            .await
            .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            client: reqwest::Client::new(),
        })
    }

    /// URL of `path` on the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Shared reqwest client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// `GET path` with the test credential
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(TEST_KEY)
    }

    /// `POST path` with the test credential and a JSON body
    pub fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(TEST_KEY).json(body)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
