//! Result documents produced by load and stress runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Smallest duration a run may report, so throughput is always defined
pub const MIN_DURATION_SECONDS: f64 = 0.001;

/// Wall-clock window a run covered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunWindow {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl RunWindow {
    /// Window starting at `started_at` and lasting `elapsed`
    pub fn new(started_at: DateTime<Utc>, elapsed: Duration) -> Self {
        let ended_at = started_at
            + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            started_at,
            ended_at,
            duration_seconds: elapsed.as_secs_f64().max(MIN_DURATION_SECONDS),
        }
    }
}

/// Distribution of one timing series in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Number of samples that carried this metric
    pub samples: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

/// Aggregate of one load test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTestResult {
    pub test_type: String,
    pub target_url: String,
    pub num_users: usize,
    pub requests_per_user: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub success_rate: f64,
    pub error_rate: f64,
    pub throughput_rps: f64,
    pub latency: LatencyStats,
    pub ttfb: LatencyStats,
    pub error_breakdown: BTreeMap<String, usize>,
}

impl LoadTestResult {
    /// Attach the run parameters the aggregator does not know about
    pub fn with_run_info(
        mut self,
        target_url: impl Into<String>,
        num_users: usize,
        requests_per_user: usize,
    ) -> Self {
        self.target_url = target_url.into();
        self.num_users = num_users;
        self.requests_per_user = requests_per_user;
        self
    }
}

/// One concurrency tier of a stress sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressLevel {
    pub user_count: usize,
    pub result: LoadTestResult,
    pub is_breaking_point: bool,
}

/// Outcome of a full stress sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestResult {
    pub test_type: String,
    pub target_url: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub max_users: usize,
    pub increment_users: usize,
    pub break_threshold_percent: f64,
    pub levels: Vec<StressLevel>,
    pub breaking_point_user_count: Option<usize>,
    /// True when every level up to `max_users` ran without crossing the threshold
    pub reached_max_users: bool,
}

impl StressTestResult {
    pub fn breaking_level(&self) -> Option<&StressLevel> {
        self.levels.iter().find(|level| level.is_breaking_point)
    }
}
