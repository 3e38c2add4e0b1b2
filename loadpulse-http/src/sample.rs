//! Per-request measurements
//!
//! A [`RequestOutcome`] is what the executor observes for one request. The
//! workload generator stamps it with the issuing user and ordinal to form a
//! [`RequestSample`]. Both types can only be built through constructors that
//! keep `success` and `error_category` mutually exclusive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Longest error message kept on a sample
pub const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// Why a request did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Transport timeout, or cancelled by the run deadline
    Timeout,
    /// DNS failure, refused or reset connection
    ConnectionError,
    /// A response arrived with status >= 400
    HttpError,
    /// Anything else
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Timeout => "Timeout",
            ErrorCategory::ConnectionError => "ConnectionError",
            ErrorCategory::HttpError => "HttpError",
            ErrorCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the executor saw for a single request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    dispatched_at: DateTime<Utc>,
    ttfb_ms: Option<f64>,
    latency_ms: Option<f64>,
    status_code: Option<u16>,
    error_category: Option<ErrorCategory>,
    error_message: Option<String>,
}

impl RequestOutcome {
    /// A fully read response; statuses >= 400 are classified as `HttpError`
    pub fn response(
        dispatched_at: DateTime<Utc>,
        status_code: u16,
        ttfb: Duration,
        latency: Duration,
    ) -> Self {
        let (error_category, error_message) = if status_code >= 400 {
            (
                Some(ErrorCategory::HttpError),
                Some(format!("HTTP {}", status_code)),
            )
        } else {
            (None, None)
        };

        Self {
            dispatched_at,
            ttfb_ms: Some(as_millis(ttfb)),
            latency_ms: Some(as_millis(latency)),
            status_code: Some(status_code),
            error_category,
            error_message,
        }
    }

    /// The request failed definitively after `elapsed`, before any response
    pub fn failure(
        dispatched_at: DateTime<Utc>,
        category: ErrorCategory,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            dispatched_at,
            ttfb_ms: None,
            latency_ms: Some(as_millis(elapsed)),
            status_code: None,
            error_category: Some(category),
            error_message: Some(truncate_message(message.into())),
        }
    }

    /// The request timed out, or was cut off by the run, with no response
    pub fn timed_out(dispatched_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            dispatched_at,
            ttfb_ms: None,
            latency_ms: None,
            status_code: None,
            error_category: Some(ErrorCategory::Timeout),
            error_message: Some(truncate_message(message.into())),
        }
    }

    /// Headers arrived but reading the body failed after `elapsed`
    pub fn interrupted(
        dispatched_at: DateTime<Utc>,
        category: ErrorCategory,
        message: impl Into<String>,
        status_code: u16,
        ttfb: Duration,
        elapsed: Duration,
    ) -> Self {
        Self {
            dispatched_at,
            ttfb_ms: Some(as_millis(ttfb)),
            latency_ms: Some(as_millis(elapsed)),
            status_code: Some(status_code),
            error_category: Some(category),
            error_message: Some(truncate_message(message.into())),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_category.is_none()
    }

    pub fn error_category(&self) -> Option<ErrorCategory> {
        self.error_category
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn latency_ms(&self) -> Option<f64> {
        self.latency_ms
    }

    pub fn ttfb_ms(&self) -> Option<f64> {
        self.ttfb_ms
    }
}

/// One attempted request, attributed to its virtual user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSample {
    user_index: usize,
    sequence_index: usize,
    dispatched_at: DateTime<Utc>,
    ttfb_ms: Option<f64>,
    latency_ms: Option<f64>,
    success: bool,
    error_category: Option<ErrorCategory>,
    status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl RequestSample {
    pub fn new(user_index: usize, sequence_index: usize, outcome: RequestOutcome) -> Self {
        Self {
            user_index,
            sequence_index,
            dispatched_at: outcome.dispatched_at,
            ttfb_ms: outcome.ttfb_ms,
            latency_ms: outcome.latency_ms,
            success: outcome.error_category.is_none(),
            error_category: outcome.error_category,
            status_code: outcome.status_code,
            error_message: outcome.error_message,
        }
    }

    pub fn user_index(&self) -> usize {
        self.user_index
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    pub fn dispatched_at(&self) -> DateTime<Utc> {
        self.dispatched_at
    }

    /// Time to first response byte; absent when no response was observed
    pub fn ttfb_ms(&self) -> Option<f64> {
        self.ttfb_ms
    }

    /// Time to full completion or definitive failure; absent on timeout
    pub fn latency_ms(&self) -> Option<f64> {
        self.latency_ms
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_category(&self) -> Option<ErrorCategory> {
        self.error_category
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

fn truncate_message(message: String) -> String {
    if message.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return message;
    }
    message.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_http_error_split_at_400() {
        let now = Utc::now();
        let ok = RequestOutcome::response(now, 302, Duration::from_millis(5), Duration::from_millis(8));
        assert!(ok.is_success());
        assert_eq!(ok.error_category(), None);

        let not_found = RequestOutcome::response(now, 404, Duration::from_millis(5), Duration::from_millis(8));
        assert!(!not_found.is_success());
        assert_eq!(not_found.error_category(), Some(ErrorCategory::HttpError));
        assert_eq!(not_found.status_code(), Some(404));
        assert_eq!(not_found.latency_ms(), Some(8.0));
    }

    #[test]
    fn test_failure_keeps_time_to_failure() {
        let outcome = RequestOutcome::failure(
            Utc::now(),
            ErrorCategory::ConnectionError,
            "refused",
            Duration::from_millis(3),
        );
        let sample = RequestSample::new(3, 1, outcome);

        assert!(!sample.is_success());
        assert_eq!(sample.error_category(), Some(ErrorCategory::ConnectionError));
        assert_eq!(sample.latency_ms(), Some(3.0));
        assert_eq!(sample.ttfb_ms(), None);
        assert_eq!(sample.status_code(), None);
        assert_eq!(sample.user_index(), 3);
        assert_eq!(sample.sequence_index(), 1);
    }

    #[test]
    fn test_timeout_carries_no_timings() {
        let sample = RequestSample::new(0, 4, RequestOutcome::timed_out(Utc::now(), "deadline"));

        assert_eq!(sample.error_category(), Some(ErrorCategory::Timeout));
        assert!(!sample.is_success());
        assert_eq!(sample.latency_ms(), None);
        assert_eq!(sample.ttfb_ms(), None);
    }

    #[test]
    fn test_long_messages_are_truncated() {
        let outcome = RequestOutcome::failure(
            Utc::now(),
            ErrorCategory::Unknown,
            "é".repeat(500),
            Duration::ZERO,
        );
        let sample = RequestSample::new(0, 0, outcome);
        assert_eq!(sample.error_message().map(|m| m.chars().count()), Some(MAX_ERROR_MESSAGE_LEN));
    }

    #[test]
    fn test_sample_json_shape() {
        let outcome = RequestOutcome::response(
            Utc::now(),
            200,
            Duration::from_millis(40),
            Duration::from_millis(100),
        );
        let value = serde_json::to_value(RequestSample::new(1, 2, outcome)).unwrap();

        assert_eq!(value["user_index"], 1);
        assert_eq!(value["sequence_index"], 2);
        assert_eq!(value["success"], true);
        assert_eq!(value["error_category"], serde_json::Value::Null);
        assert_eq!(value["latency_ms"], 100.0);
        assert_eq!(value["status_code"], 200);
        assert!(value.get("error_message").is_none());

        let failed = RequestSample::new(
            0,
            0,
            RequestOutcome::timed_out(Utc::now(), "timed out"),
        );
        let value = serde_json::to_value(failed).unwrap();
        assert_eq!(value["error_category"], "Timeout");
        assert_eq!(value["ttfb_ms"], serde_json::Value::Null);
    }
}
