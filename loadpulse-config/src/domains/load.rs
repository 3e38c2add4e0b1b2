//! Load test run configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters of a single fixed-population load test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadTestConfig {
    /// Number of concurrent virtual users
    #[serde(default = "default_num_users")]
    pub num_users: usize,

    /// Requests each virtual user issues sequentially
    #[serde(default = "default_requests_per_user")]
    pub requests_per_user: usize,

    /// Interval over which users are released
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_ramp_up"
    )]
    pub ramp_up: Duration,

    /// Pause between consecutive requests of one user
    #[serde(
        rename = "think_time_ms",
        with = "crate::domains::utils::serde_millis",
        default = "default_think_time"
    )]
    pub think_time: Duration,

    /// Per-request timeout; falls back to `target.default_timeout`
    #[serde(
        with = "crate::domains::utils::serde_duration_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,

    /// Global wall-clock deadline for the whole run
    #[serde(
        with = "crate::domains::utils::serde_duration_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_duration: Option<Duration>,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            num_users: default_num_users(),
            requests_per_user: default_requests_per_user(),
            ramp_up: default_ramp_up(),
            think_time: default_think_time(),
            timeout: None,
            max_duration: None,
        }
    }
}

impl Validatable for LoadTestConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.num_users, "num_users", self.domain_name())?;
        validate_positive(
            self.requests_per_user,
            "requests_per_user",
            self.domain_name(),
        )?;

        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(self.validation_error("timeout must be greater than 0"));
            }
        }

        if let Some(deadline) = self.max_duration {
            if deadline.is_zero() {
                return Err(self.validation_error("max_duration must be greater than 0"));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

fn default_num_users() -> usize {
    10
}

fn default_requests_per_user() -> usize {
    10
}

fn default_ramp_up() -> Duration {
    Duration::from_secs(30)
}

fn default_think_time() -> Duration {
    Duration::from_millis(500)
}
