//! Metrics aggregation over a completed sample set
//!
//! Runs strictly after every virtual user has been joined, so it reads a
//! stable slice and never touches the clock: the run window is supplied.

use crate::result::{LatencyStats, LoadTestResult, RunWindow};
use loadpulse_http::RequestSample;
use std::collections::BTreeMap;

/// Nearest-rank percentile of an ascending series
///
/// Takes the value at rank `ceil(p/100 * N) - 1`, clamped to `[0, N-1]`.
/// Returns 0 for an empty series.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = (p * n as f64 / 100.0).ceil() as i64 - 1;
    let index = rank.clamp(0, n as i64 - 1) as usize;
    sorted[index]
}

impl LatencyStats {
    /// Summarise a series; order of `values` does not matter
    pub fn from_series(mut values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let sum: f64 = values.iter().sum();
        Self {
            samples: values.len(),
            min_ms: values[0],
            max_ms: values[values.len() - 1],
            avg_ms: sum / values.len() as f64,
            p50_ms: percentile(&values, 50.0),
            p95_ms: percentile(&values, 95.0),
            p99_ms: percentile(&values, 99.0),
        }
    }
}

/// Turns a run's samples into a [`LoadTestResult`]
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Deterministic for a given sample set and window
    pub fn aggregate(samples: &[RequestSample], window: &RunWindow) -> LoadTestResult {
        let total_requests = samples.len();
        let successful_requests = samples.iter().filter(|s| s.is_success()).count();
        let failed_requests = total_requests - successful_requests;

        let mut error_breakdown = BTreeMap::new();
        for category in samples.iter().filter_map(|s| s.error_category()) {
            *error_breakdown
                .entry(category.as_str().to_string())
                .or_insert(0) += 1;
        }

        let (success_rate, error_rate) = if total_requests == 0 {
            (0.0, 0.0)
        } else {
            (
                successful_requests as f64 / total_requests as f64 * 100.0,
                failed_requests as f64 / total_requests as f64 * 100.0,
            )
        };

        let latency = LatencyStats::from_series(samples.iter().filter_map(|s| s.latency_ms()).collect());
        let ttfb = LatencyStats::from_series(samples.iter().filter_map(|s| s.ttfb_ms()).collect());

        LoadTestResult {
            test_type: "load".to_string(),
            target_url: String::new(),
            num_users: 0,
            requests_per_user: 0,
            started_at: window.started_at,
            ended_at: window.ended_at,
            duration_seconds: window.duration_seconds,
            total_requests,
            successful_requests,
            failed_requests,
            success_rate,
            error_rate,
            throughput_rps: total_requests as f64 / window.duration_seconds,
            latency,
            ttfb,
            error_breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loadpulse_http::{ErrorCategory, RequestOutcome};
    use std::time::Duration;

    fn ok(latency_ms: u64) -> RequestSample {
        let outcome = RequestOutcome::response(
            Utc::now(),
            200,
            Duration::from_millis(latency_ms / 2),
            Duration::from_millis(latency_ms),
        );
        RequestSample::new(0, 0, outcome)
    }

    fn timed_out() -> RequestSample {
        RequestSample::new(0, 0, RequestOutcome::timed_out(Utc::now(), "boom"))
    }

    fn refused(after_ms: u64) -> RequestSample {
        let outcome = RequestOutcome::failure(
            Utc::now(),
            ErrorCategory::ConnectionError,
            "refused",
            Duration::from_millis(after_ms),
        );
        RequestSample::new(0, 0, outcome)
    }

    fn timed(ttfb_ms: u64, latency_ms: u64) -> RequestSample {
        let outcome = RequestOutcome::response(
            Utc::now(),
            200,
            Duration::from_millis(ttfb_ms),
            Duration::from_millis(latency_ms),
        );
        RequestSample::new(0, 0, outcome)
    }

    fn window(seconds: u64) -> RunWindow {
        RunWindow::new(Utc::now(), Duration::from_secs(seconds))
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let series = [100.0, 200.0, 300.0, 400.0, 500.0];
        assert_eq!(percentile(&series, 95.0), 500.0);
        assert_eq!(percentile(&series, 50.0), 300.0);
        assert_eq!(percentile(&series, 0.0), 100.0);
        assert_eq!(percentile(&series, 100.0), 500.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_p99_of_one_hundred_values() {
        let series: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&series, 99.0), 99.0);
        assert_eq!(percentile(&series, 50.0), 50.0);
    }

    #[test]
    fn test_uniform_success() {
        let samples: Vec<_> = (0..6).map(|_| ok(100)).collect();
        let result = MetricsAggregator::aggregate(&samples, &window(2));

        assert_eq!(result.total_requests, 6);
        assert_eq!(result.success_rate, 100.0);
        assert_eq!(result.error_rate, 0.0);
        assert_eq!(result.latency.avg_ms, 100.0);
        assert_eq!(result.latency.p50_ms, 100.0);
        assert_eq!(result.ttfb.avg_ms, 50.0);
        assert_eq!(result.throughput_rps, 3.0);
        assert!(result.error_breakdown.is_empty());
    }

    #[test]
    fn test_timeouts_counted_but_excluded_from_latency() {
        let mut samples: Vec<_> = (0..3).map(|_| ok(200)).collect();
        samples.extend((0..3).map(|_| timed_out()));

        let result = MetricsAggregator::aggregate(&samples, &window(1));

        assert_eq!(result.total_requests, 6);
        assert_eq!(result.successful_requests, 3);
        assert_eq!(result.failed_requests, 3);
        assert_eq!(result.success_rate, 50.0);
        assert_eq!(result.error_breakdown.get("Timeout"), Some(&3));
        assert_eq!(result.error_breakdown.len(), 1);
        assert_eq!(result.latency.samples, 3);
        assert_eq!(result.latency.max_ms, 200.0);
    }

    #[test]
    fn test_percentiles_are_ordered() {
        let samples: Vec<_> = [5, 900, 40, 40, 120, 7, 300, 15].iter().map(|&ms| ok(ms)).collect();
        let stats = MetricsAggregator::aggregate(&samples, &window(1)).latency;

        assert!(stats.min_ms <= stats.p50_ms);
        assert!(stats.p50_ms <= stats.p95_ms);
        assert!(stats.p95_ms <= stats.p99_ms);
        assert!(stats.p99_ms <= stats.max_ms);
        assert_eq!(stats.min_ms, 5.0);
        assert_eq!(stats.max_ms, 900.0);
    }

    #[test]
    fn test_empty_sample_set() {
        let result = MetricsAggregator::aggregate(&[], &window(0));

        assert_eq!(result.total_requests, 0);
        assert_eq!(result.success_rate, 0.0);
        assert_eq!(result.latency, LatencyStats::default());
        assert_eq!(result.ttfb.samples, 0);
        assert!(result.duration_seconds > 0.0);
        assert_eq!(result.throughput_rps, 0.0);
    }

    #[test]
    fn test_ttfb_percentiles_are_independent_of_latency() {
        // TTFB order runs opposite to latency order
        let samples: Vec<_> = (1..=20).map(|i| timed(210 - i * 10, 100 + i * 10)).collect();
        let result = MetricsAggregator::aggregate(&samples, &window(1));

        assert_eq!(result.ttfb.samples, 20);
        assert_eq!(result.ttfb.min_ms, 10.0);
        assert_eq!(result.ttfb.max_ms, 200.0);
        assert_eq!(result.ttfb.p50_ms, 100.0);
        assert_eq!(result.ttfb.p95_ms, 190.0);
        assert_eq!(result.ttfb.p99_ms, 200.0);
        assert_eq!(result.ttfb.avg_ms, 105.0);

        assert_eq!(result.latency.min_ms, 110.0);
        assert_eq!(result.latency.p50_ms, 200.0);
        assert_eq!(result.latency.p95_ms, 290.0);
        assert_eq!(result.latency.p99_ms, 300.0);
    }

    #[test]
    fn test_ttfb_series_skips_samples_without_first_byte() {
        let samples = vec![timed(40, 90), timed(20, 60), refused(5), timed_out()];
        let result = MetricsAggregator::aggregate(&samples, &window(1));

        assert_eq!(result.ttfb.samples, 2);
        assert_eq!(result.ttfb.p50_ms, 20.0);
        assert_eq!(result.ttfb.p99_ms, 40.0);
        assert_eq!(result.latency.samples, 3);
        assert_eq!(result.latency.min_ms, 5.0);
    }

    #[test]
    fn test_http_errors_keep_their_latency() {
        let not_found = RequestSample::new(
            0,
            0,
            RequestOutcome::response(Utc::now(), 404, Duration::from_millis(10), Duration::from_millis(30)),
        );
        let samples = vec![not_found, refused(10)];
        let result = MetricsAggregator::aggregate(&samples, &window(1));

        assert_eq!(result.failed_requests, 2);
        assert_eq!(result.error_breakdown.get("HttpError"), Some(&1));
        assert_eq!(result.error_breakdown.get("ConnectionError"), Some(&1));
        assert_eq!(result.latency.samples, 2);
        assert_eq!(result.latency.avg_ms, 20.0);
        assert_eq!(result.ttfb.samples, 1);
    }
}
