use std::path::PathBuf;

use serde::Deserialize;

/// Credential store configuration
///
/// Keys are read from `keys_file` unless `INFERENCIA_API_KEYS` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// File with one accepted key per line
    #[serde(default = "default_keys_file")]
    pub keys_file: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            keys_file: default_keys_file(),
        }
    }
}

fn default_keys_file() -> PathBuf {
    PathBuf::from("./keys.txt")
}
