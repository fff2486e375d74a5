use std::time::Duration;

use serde::{Deserialize, Deserializer, de::Error};

/// Deserialize a human duration such as `"30s"` or `"5m"`
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    duration_str::parse(&raw).map_err(|e| D::Error::custom(format!("invalid duration '{raw}': {e}")))
}
