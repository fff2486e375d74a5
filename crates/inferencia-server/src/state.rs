use std::{sync::Arc, time::Duration};

use inferencia_auth::KeyStore;
use inferencia_backend::Registry;
use inferencia_config::Config;
use inferencia_ratelimit::AdmissionController;
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared state handed to handlers and middleware
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub keys: Arc<KeyStore>,
    pub limiter: Arc<AdmissionController>,
    pub metrics: PrometheusHandle,
    /// Deadline for reading a request body
    pub read_timeout: Duration,
    /// Deadline for non-streaming backend round-trips
    pub write_timeout: Duration,
    /// Largest accepted request body, in bytes
    pub max_body_size: usize,
}

impl AppState {
    /// Assemble state around an already populated registry and key store
    ///
    /// # Errors
    ///
    /// Returns an error if the admission controller rejects the rate limit
    /// settings or the metrics recorder cannot be installed
    pub fn new(config: &Config, registry: Registry, keys: KeyStore) -> anyhow::Result<Self> {
        let limiter = inferencia_ratelimit::create_admission_controller(&config.rate_limit)?;
        let metrics = inferencia_telemetry::metrics::install()?;

        Ok(Self {
            registry: Arc::new(registry),
            keys: Arc::new(keys),
            limiter: Arc::new(limiter),
            metrics,
            read_timeout: config.server.read_timeout,
            write_timeout: config.server.write_timeout,
            max_body_size: config.server.max_body_size,
        })
    }
}
