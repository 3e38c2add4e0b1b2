//! Stress sweep configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_range, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters of an incremental stress sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StressTestConfig {
    /// Highest concurrency level the sweep may reach
    #[serde(default = "default_max_users")]
    pub max_users: usize,

    /// Users added per level; also the first level
    #[serde(default = "default_increment_users")]
    pub increment_users: usize,

    /// Requests each user issues at every level
    #[serde(default = "default_requests_per_increment")]
    pub requests_per_increment: usize,

    /// A level whose success rate drops below this percentage is the breaking point
    #[serde(default = "default_break_threshold")]
    pub break_threshold_percent: f64,

    /// Ramp-up applied at every level
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
}

impl Default for StressTestConfig {
    fn default() -> Self {
        Self {
            max_users: default_max_users(),
            increment_users: default_increment_users(),
            requests_per_increment: default_requests_per_increment(),
            break_threshold_percent: default_break_threshold(),
            ramp_up: default_ramp_up(),
            think_time: default_think_time(),
            timeout: None,
        }
    }
}

impl Validatable for StressTestConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_users, "max_users", self.domain_name())?;
        validate_positive(self.increment_users, "increment_users", self.domain_name())?;
        validate_positive(
            self.requests_per_increment,
            "requests_per_increment",
            self.domain_name(),
        )?;

        if self.increment_users > self.max_users {
            return Err(self.validation_error(format!(
                "increment_users ({}) cannot exceed max_users ({})",
                self.increment_users, self.max_users
            )));
        }

        validate_range(
            self.break_threshold_percent,
            0.0,
            100.0,
            "break_threshold_percent",
            self.domain_name(),
        )?;

        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(self.validation_error("timeout must be greater than 0"));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "stress"
    }
}

fn default_max_users() -> usize {
    100
}

fn default_increment_users() -> usize {
    10
}

fn default_requests_per_increment() -> usize {
    5
}

fn default_break_threshold() -> f64 {
    50.0
}

fn default_ramp_up() -> Duration {
    Duration::from_secs(10)
}

fn default_think_time() -> Duration {
    Duration::from_millis(200)
}
