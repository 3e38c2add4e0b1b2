//! Configuration loading and environment variable handling

use crate::domains::LoadPulseConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "LOADPULSE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<LoadPulseConfig> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading configuration file");

        let content = std::fs::read_to_string(path)?;
        let mut config: LoadPulseConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<LoadPulseConfig> {
        let mut config = LoadPulseConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<LoadPulseConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut LoadPulseConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_load_overrides(&mut config.load)?;
        self.apply_stress_overrides(&mut config.stress)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_output_overrides(&mut config.output)?;
        Ok(())
    }

    /// Apply target config overrides
    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("TARGET_URL") {
            config.url = url;
        }

        if let Some(seconds) = self.parse_env_var::<u64>("DEFAULT_TIMEOUT")? {
            config.default_timeout = Duration::from_secs(seconds);
        }

        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Some(verify_ssl) = self.parse_env_var::<bool>("HTTP_VERIFY_SSL")? {
            config.verify_ssl = verify_ssl;
        }

        if let Some(pool_size) = self.parse_env_var("HTTP_POOL_SIZE")? {
            config.pool_size = Some(pool_size);
        }

        Ok(())
    }

    /// Apply load test overrides
    fn apply_load_overrides(
        &self,
        config: &mut crate::domains::load::LoadTestConfig,
    ) -> ConfigResult<()> {
        if let Some(users) = self.parse_env_var("LOAD_USERS")? {
            config.num_users = users;
        }

        if let Some(requests) = self.parse_env_var("LOAD_REQUESTS_PER_USER")? {
            config.requests_per_user = requests;
        }

        if let Some(seconds) = self.parse_env_var::<u64>("LOAD_RAMP_UP")? {
            config.ramp_up = Duration::from_secs(seconds);
        }

        if let Some(millis) = self.parse_env_var::<u64>("LOAD_THINK_TIME_MS")? {
            config.think_time = Duration::from_millis(millis);
        }

        Ok(())
    }

    /// Apply stress sweep overrides
    fn apply_stress_overrides(
        &self,
        config: &mut crate::domains::stress::StressTestConfig,
    ) -> ConfigResult<()> {
        if let Some(max_users) = self.parse_env_var("STRESS_MAX_USERS")? {
            config.max_users = max_users;
        }

        if let Some(increment) = self.parse_env_var("STRESS_INCREMENT")? {
            config.increment_users = increment;
        }

        if let Some(threshold) = self.parse_env_var("STRESS_BREAK_THRESHOLD")? {
            config.break_threshold_percent = threshold;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Apply output config overrides
    fn apply_output_overrides(
        &self,
        config: &mut crate::domains::output::OutputConfig,
    ) -> ConfigResult<()> {
        if let Ok(dir) = self.get_env_var("RESULTS_DIR") {
            config.results_dir = dir;
        }

        Ok(())
    }

    /// Parse a prefixed environment variable, if set
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
