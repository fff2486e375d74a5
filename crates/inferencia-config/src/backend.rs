use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Kind of upstream inference engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// MLX server speaking the OpenAI dialect
    Mlx,
    /// Ollama, not yet translated
    Ollama,
}

impl BackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mlx => "mlx",
            Self::Ollama => "ollama",
        }
    }
}

/// One upstream inference engine
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Unique registry name
    pub name: String,
    /// Adapter used to talk to the engine
    #[serde(rename = "type")]
    pub kind: BackendKind,
    /// Base URL of the engine
    pub url: Url,
    /// Deadline for non-streaming calls and health probes
    #[serde(default = "default_timeout", deserialize_with = "crate::duration::deserialize")]
    pub timeout: Duration,
}

pub(crate) fn default_backends() -> Vec<BackendConfig> {
    vec![BackendConfig {
        name: "mlx".to_string(),
        kind: BackendKind::Mlx,
        url: Url::parse("http://localhost:11973").expect("default backend url must parse"),
        timeout: default_timeout(),
    }]
}

const fn default_timeout() -> Duration {
    Duration::from_secs(60)
}
