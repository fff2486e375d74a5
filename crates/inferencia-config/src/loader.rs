use std::{collections::HashSet, path::Path};

use crate::{Config, log::LEVELS};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, deserializes,
    /// applies `INFERENCIA_*` overrides and validates the result. A missing
    /// file yields the defaults, still subject to overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, expansion or parsing
    /// fails, an override is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => anyhow::bail!("failed to read config file {}: {e}", path.display()),
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration text without applying overrides or validation
    ///
    /// # Errors
    ///
    /// Returns an error if expansion or TOML parsing fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_server()?;
        self.validate_backends()?;
        self.validate_rate_limit()?;
        self.validate_log()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("server.port must be between 1 and 65535");
        }
        if self.server.max_body_size == 0 {
            anyhow::bail!("server.max_body_size must be greater than 0");
        }
        Ok(())
    }

    fn validate_backends(&self) -> anyhow::Result<()> {
        if self.backends.is_empty() {
            anyhow::bail!("at least one backend must be configured");
        }

        let mut seen = HashSet::new();
        for (index, backend) in self.backends.iter().enumerate() {
            if backend.name.trim().is_empty() {
                anyhow::bail!("backends[{index}].name must not be empty");
            }
            if !seen.insert(backend.name.as_str()) {
                anyhow::bail!("backend name '{}' is configured more than once", backend.name);
            }
            if !matches!(backend.url.scheme(), "http" | "https") {
                anyhow::bail!("backend '{}' url must use http or https", backend.name);
            }
            if backend.timeout.is_zero() {
                anyhow::bail!("backend '{}' timeout must be greater than 0", backend.name);
            }
        }

        Ok(())
    }

    fn validate_rate_limit(&self) -> anyhow::Result<()> {
        let rate_limit = &self.rate_limit;
        if !(rate_limit.requests_per_second.is_finite() && rate_limit.requests_per_second > 0.0) {
            anyhow::bail!("rate_limit.requests_per_second must be greater than 0");
        }
        if rate_limit.burst < 1 {
            anyhow::bail!("rate_limit.burst must be at least 1");
        }
        if rate_limit.sweep_interval.is_zero() {
            anyhow::bail!("rate_limit.sweep_interval must be greater than 0");
        }
        Ok(())
    }

    fn validate_log(&self) -> anyhow::Result<()> {
        if !LEVELS.contains(&self.log.level.as_str()) {
            anyhow::bail!("log.level must be one of {}, got '{}'", LEVELS.join(", "), self.log.level);
        }
        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        if let Some(ref telemetry) = self.telemetry
            && !(0.0..=1.0).contains(&telemetry.sampling_rate)
        {
            anyhow::bail!("telemetry.sampling_rate must be between 0.0 and 1.0");
        }
        Ok(())
    }
}
