//! Request executor: issues one HTTP request and measures it

use crate::errors::HttpError;
use crate::sample::{ErrorCategory, RequestOutcome};
use crate::types::HttpMethod;
use chrono::Utc;
use loadpulse_config::HttpConfig;
use reqwest::Client;
use std::error::Error as StdError;
use std::io::ErrorKind;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Issues a single request and reports what happened
///
/// Implementations must never fail: every failure mode is folded into the
/// returned outcome so callers need no per-request error handling.
#[async_trait::async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, target_url: &str, timeout: Duration) -> RequestOutcome;
}

/// `reqwest`-backed executor sharing one connection pool across all users
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    method: HttpMethod,
}

impl HttpExecutor {
    /// Build the pooled client for a run of up to `concurrent_users`
    pub fn new(config: &HttpConfig, method: HttpMethod, concurrent_users: usize) -> Result<Self, HttpError> {
        let pool_size = config.pool_size_for(concurrent_users);
        debug!(
            method = %method,
            pool_size,
            redirect_limit = config.redirect_limit,
            verify_ssl = config.verify_ssl,
            "Creating HTTP executor"
        );

        let redirects = if config.follows_redirects() {
            reqwest::redirect::Policy::limited(config.redirect_limit as usize)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(redirects)
            .pool_max_idle_per_host(pool_size)
            .pool_idle_timeout(config.pool_idle_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { client, method })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }
}

#[async_trait::async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, target_url: &str, timeout: Duration) -> RequestOutcome {
        let dispatched_at = Utc::now();
        let started = Instant::now();

        let request = self
            .client
            .request(self.method.into(), target_url)
            .timeout(timeout);

        let mut response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let category = classify_error(&e);
                trace!(url = target_url, category = %category, error = %e, "Request failed");
                return match category {
                    ErrorCategory::Timeout => RequestOutcome::timed_out(dispatched_at, describe_error(&e)),
                    _ => RequestOutcome::failure(dispatched_at, category, describe_error(&e), started.elapsed()),
                };
            }
        };

        // Headers are in: this is the first-byte boundary.
        let ttfb = started.elapsed();
        let status = response.status().as_u16();

        loop {
            match response.chunk().await {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => {
                    let category = classify_error(&e);
                    trace!(url = target_url, status, category = %category, "Body read failed");
                    return RequestOutcome::interrupted(
                        dispatched_at,
                        category,
                        describe_error(&e),
                        status,
                        ttfb,
                        started.elapsed(),
                    );
                }
            }
        }

        RequestOutcome::response(dispatched_at, status, ttfb, started.elapsed())
    }
}

/// Map a transport error onto the closed error taxonomy
pub fn classify_error(error: &reqwest::Error) -> ErrorCategory {
    if error.is_timeout() {
        return ErrorCategory::Timeout;
    }
    if error.is_connect() {
        return ErrorCategory::ConnectionError;
    }
    classify_source_chain(error)
}

/// Inspect nested causes for I/O errors that identify the failure
pub fn classify_source_chain(error: &(dyn StdError + 'static)) -> ErrorCategory {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);

    while let Some(cause) = current {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                ErrorKind::TimedOut => return ErrorCategory::Timeout,
                ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::NotConnected
                | ErrorKind::BrokenPipe
                | ErrorKind::AddrNotAvailable => return ErrorCategory::ConnectionError,
                _ => {}
            }
        }
        current = cause.source();
    }

    ErrorCategory::Unknown
}

/// Flatten an error and its causes into one line
fn describe_error(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
