//! Programmatic configuration builder for integration tests

use std::time::Duration;

use inferencia_config::{BackendConfig, BackendKind, Config, RateLimitConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal configuration with no backends and a generous rate limit
    pub fn new() -> Self {
        let mut config = Config::default();
        config.backends.clear();
        config.rate_limit = RateLimitConfig {
            requests_per_second: 1000.0,
            burst: 1000,
            ..RateLimitConfig::default()
        };

        Self { config }
    }

    /// Add an MLX backend pointed at `url`
    pub fn with_mlx_backend(self, name: &str, url: &str) -> Self {
        self.with_backend(name, BackendKind::Mlx, url)
    }

    /// Add an Ollama backend, every call of which fails as not implemented
    pub fn with_ollama_backend(self, name: &str, url: &str) -> Self {
        self.with_backend(name, BackendKind::Ollama, url)
    }

    fn with_backend(mut self, name: &str, kind: BackendKind, url: &str) -> Self {
        self.config.backends.push(BackendConfig {
            name: name.to_owned(),
            kind,
            url: url.parse().expect("valid URL"),
            timeout: Duration::from_secs(5),
        });
        self
    }

    /// Set admission control rate and burst
    pub fn with_rate_limit(mut self, requests_per_second: f64, burst: u32) -> Self {
        self.config.rate_limit.requests_per_second = requests_per_second;
        self.config.rate_limit.burst = burst;
        self
    }

    /// Set the deadline for non-streaming responses
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.config.server.write_timeout = timeout;
        self
    }

    /// Set the largest accepted request body
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.config.server.max_body_size = bytes;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
