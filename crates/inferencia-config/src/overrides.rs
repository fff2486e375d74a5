use std::str::FromStr;

use crate::{Config, LogFormat};

impl Config {
    /// Apply `INFERENCIA_*` environment overrides on top of the file values
    ///
    /// Empty variables are ignored. A value that does not parse for its
    /// field is an error rather than a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable holds an unparsable value
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Some(host) = var("INFERENCIA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parsed::<u16>("INFERENCIA_PORT")? {
            self.server.port = port;
        }
        if let Some(path) = var("INFERENCIA_AUTH_KEYS_FILE") {
            self.auth.keys_file = path.into();
        }
        if let Some(level) = var("INFERENCIA_LOG_LEVEL") {
            self.log.level = level.to_ascii_lowercase();
        }
        if let Some(format) = var("INFERENCIA_LOG_FORMAT") {
            self.log.format = LogFormat::from_str(&format).map_err(|e| anyhow::anyhow!("INFERENCIA_LOG_FORMAT: {e}"))?;
        }
        if let Some(rps) = parsed::<f64>("INFERENCIA_RATELIMIT_RPS")? {
            self.rate_limit.requests_per_second = rps;
        }
        if let Some(burst) = parsed::<u32>("INFERENCIA_RATELIMIT_BURST")? {
            self.rate_limit.burst = burst;
        }
        if let Some(url) = var("INFERENCIA_BACKEND_URL")
            && let Some(first) = self.backends.first_mut()
        {
            first.url = url
                .parse()
                .map_err(|e| anyhow::anyhow!("INFERENCIA_BACKEND_URL is not a valid URL: {e}"))?;
        }

        Ok(())
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| raw.parse::<T>().map_err(|e| anyhow::anyhow!("{name}={raw}: {e}")))
        .transpose()
}
