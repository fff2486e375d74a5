#![allow(clippy::must_use_candidate)]

pub mod auth;
pub mod backend;
mod duration;
mod env;
mod loader;
pub mod log;
mod overrides;
pub mod rate_limit;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use auth::*;
pub use backend::*;
pub use log::*;
pub use rate_limit::*;
pub use server::*;
pub use telemetry::TelemetryConfig;

/// Top-level inferencia configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listener and timeout settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Credential store settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upstream inference engines, the first entry is the primary
    #[serde(default = "backend::default_backends")]
    pub backends: Vec<BackendConfig>,
    /// Per-key admission control
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Log level and output format
    #[serde(default)]
    pub log: LogConfig,
    /// Optional OTLP trace export
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            backends: backend::default_backends(),
            rate_limit: RateLimitConfig::default(),
            log: LogConfig::default(),
            telemetry: None,
        }
    }
}
