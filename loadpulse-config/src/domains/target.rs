//! Target endpoint configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_target_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Read-only view of the endpoint under test
///
/// The engine only needs the URL and a fallback request timeout, so it depends
/// on this trait rather than on the whole configuration document.
pub trait TargetSettings: Send + Sync {
    /// URL every virtual user requests
    fn target_url(&self) -> &str;

    /// Timeout applied when a run does not set its own
    fn default_timeout_seconds(&self) -> f64;

    /// HTTP method used for each request
    fn method(&self) -> &str {
        "GET"
    }
}

/// The endpoint that load is generated against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Absolute http/https URL
    #[serde(default = "default_url")]
    pub url: String,

    /// HTTP method, e.g. GET or POST
    #[serde(default = "default_method")]
    pub method: String,

    /// Per-request timeout used when a run leaves `timeout` unset
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_timeout"
    )]
    pub default_timeout: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            method: default_method(),
            default_timeout: default_timeout(),
        }
    }
}

impl TargetSettings for TargetConfig {
    fn target_url(&self) -> &str {
        &self.url
    }

    fn default_timeout_seconds(&self) -> f64 {
        self.default_timeout.as_secs_f64()
    }

    fn method(&self) -> &str {
        &self.method
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_target_url(&self.url, "url", self.domain_name())?;
        validate_positive(
            self.default_timeout.as_secs(),
            "default_timeout",
            self.domain_name(),
        )?;

        let known = [
            "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS",
        ];
        crate::validation::validate_enum_choice(&self.method, &known, "method", self.domain_name())?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

fn default_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}
