use std::time::Duration;

use serde::Deserialize;

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind, a hostname or an IP address
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to bind
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline for reading a request body
    #[serde(default = "default_read_timeout", deserialize_with = "crate::duration::deserialize")]
    pub read_timeout: Duration,
    /// Deadline for producing a non-streaming response
    #[serde(default = "default_write_timeout", deserialize_with = "crate::duration::deserialize")]
    pub write_timeout: Duration,
    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Grace window for in-flight requests after a shutdown signal
    #[serde(default = "default_shutdown_timeout", deserialize_with = "crate::duration::deserialize")]
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// `host:port` suitable for binding a listener
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_timeout: default_read_timeout(),
            write_timeout: default_write_timeout(),
            max_body_size: default_max_body_size(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_read_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_write_timeout() -> Duration {
    Duration::from_secs(120)
}

const fn default_max_body_size() -> usize {
    64 * 1024 * 1024
}

const fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(10)
}
