//! Client settings for the connection pool every virtual user shares

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_range, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard ceiling on redirect hops per request
pub const MAX_REDIRECT_LIMIT: u32 = 20;

/// Shared HTTP client settings
///
/// Per-request timeouts belong to the run (`load.timeout` / `stress.timeout`,
/// falling back to `target.default_timeout`), not to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Sent with every request so target operators can spot test traffic
    pub user_agent: String,

    pub verify_ssl: bool,

    /// Redirect hops followed per request; 0 records the 3xx itself
    pub redirect_limit: u32,

    /// Idle keep-alive connections kept per host
    ///
    /// Unset sizes the pool to the number of concurrent virtual users, so a
    /// warm run never reconnects between requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,

    /// Seconds an unused pooled connection is kept open
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub pool_idle_timeout: Duration,

    /// Seconds allowed for TCP and TLS setup
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub connect_timeout: Duration,
}

impl HttpConfig {
    /// Idle connections to keep per host for a run of `concurrent_users`
    pub fn pool_size_for(&self, concurrent_users: usize) -> usize {
        self.pool_size.unwrap_or(concurrent_users).max(1)
    }

    pub fn follows_redirects(&self) -> bool {
        self.redirect_limit > 0
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("loadpulse/{}", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            redirect_limit: 10,
            pool_size: None,
            pool_idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        validate_range(
            self.redirect_limit,
            0,
            MAX_REDIRECT_LIMIT,
            "redirect_limit",
            self.domain_name(),
        )?;
        if let Some(pool_size) = self.pool_size {
            validate_positive(pool_size, "pool_size", self.domain_name())?;
        }
        validate_positive(
            self.pool_idle_timeout.as_secs(),
            "pool_idle_timeout",
            self.domain_name(),
        )?;
        validate_positive(
            self.connect_timeout.as_secs(),
            "connect_timeout",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}
