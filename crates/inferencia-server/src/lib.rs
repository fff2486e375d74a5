//! HTTP surface of Inferencia: routes, the middleware pipeline and the
//! streaming relay

mod extract;
mod handlers;
pub mod middleware;
mod relay;
mod state;

use std::{future::IntoFuture, net::SocketAddr, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use inferencia_auth::KeyStore;
use inferencia_backend::Registry;
use inferencia_config::{BackendKind, Config};
use tokio_util::sync::CancellationToken;

pub use relay::{RelaySink, RelayState};
pub use state::AppState;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: String,
    shutdown_timeout: Duration,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Loads the credential store and constructs one adapter per configured
    /// backend.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials can be loaded, an adapter cannot
    /// be built, or the rate limit settings are rejected
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let keys = KeyStore::load(&config.auth)?;
        tracing::info!(keys = keys.len(), "loaded API keys");

        let registry = build_registry(config)?;
        Self::with_parts(config, registry, keys)
    }

    /// Build the server around a prepared registry and key store
    ///
    /// # Errors
    ///
    /// Returns an error if the rate limit settings are rejected or the
    /// metrics recorder cannot be installed
    pub fn with_parts(config: &Config, registry: Registry, keys: KeyStore) -> anyhow::Result<Self> {
        middleware::install_panic_hook();

        let state = AppState::new(config, registry, keys)?;

        Ok(Self {
            router: router(state),
            listen_address: config.server.bind_address(),
            shutdown_timeout: config.server.shutdown_timeout,
        })
    }

    /// Override the configured listen address
    #[must_use]
    pub fn with_listen_address(mut self, address: SocketAddr) -> Self {
        self.listen_address = address.to_string();
        self
    }

    /// Configured listen address
    pub fn listen_address(&self) -> &str {
        &self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Returns once `shutdown` fires and in-flight requests have drained, or
    /// once the shutdown grace period has elapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        let server = axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();

        let grace = self.shutdown_timeout;
        let deadline = async move {
            shutdown.cancelled().await;
            tracing::info!(grace_ms = grace.as_millis(), "graceful shutdown initiated");
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = server => result?,
            () = deadline => tracing::warn!("shutdown grace period elapsed with requests in flight"),
        }

        Ok(())
    }
}

/// Build the full route table
///
/// `/health`, `/health/ready` and `/metrics` are served bare. The API routes
/// run behind the middleware pipeline and accept bodies up to
/// `server.max_body_size`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/v1/chat/completions", post(handlers::chat::completions))
        .route("/v1/models", get(handlers::models::list))
        .route("/v1/embeddings", post(handlers::embeddings::create))
        .layer(DefaultBodyLimit::max(state.max_body_size))
        .with_state(state.clone());

    let api = middleware::chain(api, middleware::pipeline(&state));

    Router::new()
        .route("/health", get(handlers::health::live))
        .route("/health/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::metrics::render))
        .with_state(state)
        .merge(api)
}

/// Construct one adapter per configured backend, in configuration order
///
/// # Errors
///
/// Returns an error if an adapter's HTTP client cannot be built
pub fn build_registry(config: &Config) -> anyhow::Result<Registry> {
    let mut registry = Registry::new();

    for backend in &config.backends {
        if backend.kind == BackendKind::Ollama {
            tracing::warn!(
                backend = %backend.name,
                "ollama backends are not implemented yet, every call will fail"
            );
        }

        registry.register(inferencia_backend::from_config(backend)?);
        tracing::info!(backend = %backend.name, kind = backend.kind.as_str(), url = %backend.url, "registered backend");
    }

    Ok(registry)
}
