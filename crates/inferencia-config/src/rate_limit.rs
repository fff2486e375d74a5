use std::time::Duration;

use serde::Deserialize;

/// Per-key token bucket settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Tokens refilled per second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
    /// Bucket capacity
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// How often idle buckets are reclaimed
    #[serde(default = "default_sweep_interval", deserialize_with = "crate::duration::deserialize")]
    pub sweep_interval: Duration,
    /// Idle time after which a bucket is reclaimed
    #[serde(default = "default_idle_timeout", deserialize_with = "crate::duration::deserialize")]
    pub idle_timeout: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            sweep_interval: default_sweep_interval(),
            idle_timeout: default_idle_timeout(),
        }
    }
}

const fn default_requests_per_second() -> f64 {
    10.0
}

const fn default_burst() -> u32 {
    20
}

const fn default_sweep_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

const fn default_idle_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}
