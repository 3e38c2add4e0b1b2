//! Stress controller: sequential load runs at increasing concurrency
//!
//! Starts at `increment_users` and adds `increment_users` per level until
//! `max_users` is exceeded or a level's success rate falls below the break
//! threshold. Levels never overlap.

use crate::error::{EngineError, EngineResult};
use crate::result::{StressLevel, StressTestResult};
use crate::workload::{CancelHandle, LoadRunner, LoadTestParams};
use chrono::Utc;
use loadpulse_http::RequestSample;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Parameters of a stress sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressTestParams {
    pub max_users: usize,
    pub increment_users: usize,
    pub requests_per_increment: usize,
    pub break_threshold_percent: f64,
    pub ramp_up: Duration,
    pub think_time: Duration,
    pub timeout: Duration,
}

impl StressTestParams {
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_users == 0 {
            return Err(EngineError::invalid("max_users", "must be at least 1"));
        }
        if self.increment_users == 0 {
            return Err(EngineError::invalid("increment_users", "must be at least 1"));
        }
        if self.increment_users > self.max_users {
            return Err(EngineError::invalid(
                "increment_users",
                format!(
                    "{} exceeds max_users {}",
                    self.increment_users, self.max_users
                ),
            ));
        }
        if self.requests_per_increment == 0 {
            return Err(EngineError::invalid(
                "requests_per_increment",
                "must be at least 1",
            ));
        }
        if !(0.0..=100.0).contains(&self.break_threshold_percent) {
            return Err(EngineError::invalid(
                "break_threshold_percent",
                format!("{} is outside 0..=100", self.break_threshold_percent),
            ));
        }
        if self.timeout.is_zero() {
            return Err(EngineError::invalid("timeout", "must be greater than 0"));
        }
        Ok(())
    }

    /// Load test parameters for one level of the sweep
    pub fn level_params(&self, user_count: usize) -> LoadTestParams {
        LoadTestParams {
            num_users: user_count,
            requests_per_user: self.requests_per_increment,
            ramp_up: self.ramp_up,
            think_time: self.think_time,
            timeout: self.timeout,
            max_duration: None,
        }
    }
}

/// A finished sweep with one sample vector per level
#[derive(Debug, Clone)]
pub struct StressRun {
    pub result: StressTestResult,
    pub samples: Vec<Vec<RequestSample>>,
}

pub struct StressController {
    runner: Arc<dyn LoadRunner>,
    cancel: Option<CancelHandle>,
}

impl StressController {
    pub fn new(runner: Arc<dyn LoadRunner>) -> Self {
        Self {
            runner,
            cancel: None,
        }
    }

    /// Stop the sweep after the current level once `cancel` fires
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn run_sweep(&self, params: &StressTestParams) -> EngineResult<StressRun> {
        params.validate()?;

        info!(
            url = self.runner.target_url(),
            max_users = params.max_users,
            increment = params.increment_users,
            break_threshold = params.break_threshold_percent,
            "Starting stress sweep"
        );

        let started_at = Utc::now();
        let mut levels = Vec::new();
        let mut samples = Vec::new();
        let mut breaking_point = None;
        let mut completed = true;

        let mut user_count = params.increment_users;
        while user_count <= params.max_users {
            let run = self.runner.run(&params.level_params(user_count)).await?;

            if self.is_cancelled() {
                // A partial level says nothing about the target's limit.
                warn!(users = user_count, "Stress sweep cancelled");
                levels.push(StressLevel {
                    user_count,
                    result: run.result,
                    is_breaking_point: false,
                });
                samples.push(run.samples);
                completed = false;
                break;
            }

            let is_breaking_point = run.result.success_rate < params.break_threshold_percent;
            info!(
                users = user_count,
                success_rate = run.result.success_rate,
                p95_ms = run.result.latency.p95_ms,
                breaking = is_breaking_point,
                "Stress level finished"
            );

            levels.push(StressLevel {
                user_count,
                result: run.result,
                is_breaking_point,
            });
            samples.push(run.samples);

            if is_breaking_point {
                warn!(users = user_count, "Breaking point reached");
                breaking_point = Some(user_count);
                break;
            }

            user_count += params.increment_users;
        }

        let result = StressTestResult {
            test_type: "stress".to_string(),
            target_url: self.runner.target_url().to_string(),
            started_at,
            ended_at: Utc::now(),
            max_users: params.max_users,
            increment_users: params.increment_users,
            break_threshold_percent: params.break_threshold_percent,
            levels,
            breaking_point_user_count: breaking_point,
            reached_max_users: completed && breaking_point.is_none(),
        };

        if result.reached_max_users {
            info!(max_users = params.max_users, "Stress sweep reached max users without breaking");
        }

        Ok(StressRun { result, samples })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelHandle::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::MetricsAggregator;
    use crate::result::RunWindow;
    use crate::workload::LoadTestRun;
    use loadpulse_http::RequestOutcome;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers each level with a preset success rate
    struct FakeRunner {
        success_rates: HashMap<usize, f64>,
        levels_run: Mutex<Vec<usize>>,
        cancel_at: Option<(usize, CancelHandle)>,
    }

    impl FakeRunner {
        fn new(rates: &[(usize, f64)]) -> Self {
            Self {
                success_rates: rates.iter().copied().collect(),
                levels_run: Mutex::new(Vec::new()),
                cancel_at: None,
            }
        }

        fn levels_run(&self) -> Vec<usize> {
            self.levels_run.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl LoadRunner for FakeRunner {
        async fn run(&self, params: &LoadTestParams) -> EngineResult<LoadTestRun> {
            let users = params.num_users;
            self.levels_run.lock().unwrap().push(users);
            if let Some((level, handle)) = &self.cancel_at {
                if *level == users {
                    handle.cancel();
                }
            }

            let rate = self.success_rates.get(&users).copied().unwrap_or(100.0);
            let successes = (users as f64 * rate / 100.0).round() as usize;
            let samples: Vec<_> = (0..users)
                .map(|user| {
                    let outcome = if user < successes {
                        RequestOutcome::response(
                            Utc::now(),
                            200,
                            Duration::from_millis(20),
                            Duration::from_millis(50),
                        )
                    } else {
                        RequestOutcome::timed_out(Utc::now(), "slow")
                    };
                    RequestSample::new(user, 0, outcome)
                })
                .collect();

            let window = RunWindow::new(Utc::now(), Duration::from_secs(1));
            let result = MetricsAggregator::aggregate(&samples, &window).with_run_info(
                "http://target.test/",
                users,
                1,
            );
            Ok(LoadTestRun { result, samples })
        }

        fn target_url(&self) -> &str {
            "http://target.test/"
        }
    }

    fn params(max_users: usize, increment_users: usize) -> StressTestParams {
        StressTestParams {
            max_users,
            increment_users,
            requests_per_increment: 1,
            break_threshold_percent: 50.0,
            ramp_up: Duration::ZERO,
            think_time: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_breaking_point_found() {
        let runner = Arc::new(FakeRunner::new(&[(10, 100.0), (20, 100.0), (30, 40.0)]));
        let controller = StressController::new(runner.clone());

        let run = controller.run_sweep(&params(30, 10)).await.unwrap();
        let result = &run.result;

        assert_eq!(result.levels.len(), 3);
        assert_eq!(result.breaking_point_user_count, Some(30));
        assert!(!result.reached_max_users);
        assert_eq!(result.levels[2].result.success_rate, 40.0);
        assert!(result.levels[2].is_breaking_point);
        assert!(!result.levels[0].is_breaking_point && !result.levels[1].is_breaking_point);
        assert_eq!(result.breaking_level().map(|l| l.user_count), Some(30));
        assert_eq!(run.samples.len(), 3);
        assert_eq!(runner.levels_run(), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_sweep_reaches_max_without_break() {
        let runner = Arc::new(FakeRunner::new(&[]));
        let controller = StressController::new(runner.clone());

        let result = controller.run_sweep(&params(25, 10)).await.unwrap().result;

        let counts: Vec<_> = result.levels.iter().map(|l| l.user_count).collect();
        assert_eq!(counts, vec![10, 20]);
        assert_eq!(result.breaking_point_user_count, None);
        assert!(result.reached_max_users);
        assert_eq!(result.test_type, "stress");
        assert_eq!(result.target_url, "http://target.test/");
    }

    #[tokio::test]
    async fn test_degraded_level_does_not_stop_sweep() {
        let runner = Arc::new(FakeRunner::new(&[(10, 60.0), (20, 50.0), (30, 70.0)]));
        let controller = StressController::new(runner.clone());

        let result = controller.run_sweep(&params(30, 10)).await.unwrap().result;

        assert_eq!(result.levels.len(), 3);
        assert!(result.levels.iter().all(|l| !l.is_breaking_point));
        assert!(result.reached_max_users);
    }

    #[tokio::test]
    async fn test_levels_increase_by_increment() {
        let runner = Arc::new(FakeRunner::new(&[(21, 10.0)]));
        let controller = StressController::new(runner.clone());

        let result = controller.run_sweep(&params(40, 7)).await.unwrap().result;

        let counts: Vec<_> = result.levels.iter().map(|l| l.user_count).collect();
        assert_eq!(counts, vec![7, 14, 21]);
        assert_eq!(result.levels.iter().filter(|l| l.is_breaking_point).count(), 1);
        assert!(result.levels.last().is_some_and(|l| l.is_breaking_point));
    }

    #[tokio::test]
    async fn test_invalid_sweeps_run_nothing() {
        let runner = Arc::new(FakeRunner::new(&[]));
        let controller = StressController::new(runner.clone());

        for bad in [
            params(10, 0),
            params(10, 20),
            params(0, 0),
            StressTestParams {
                break_threshold_percent: 150.0,
                ..params(10, 5)
            },
            StressTestParams {
                requests_per_increment: 0,
                ..params(10, 5)
            },
        ] {
            let err = controller.run_sweep(&bad).await.unwrap_err();
            assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
        }
        assert!(runner.levels_run().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_stops_after_current_level() {
        let handle = CancelHandle::new();
        let mut runner = FakeRunner::new(&[(20, 0.0)]);
        runner.cancel_at = Some((20, handle.clone()));
        let runner = Arc::new(runner);
        let controller = StressController::new(runner.clone()).with_cancel_handle(handle);

        let result = controller.run_sweep(&params(50, 10)).await.unwrap().result;

        assert_eq!(runner.levels_run(), vec![10, 20]);
        assert_eq!(result.levels.len(), 2);
        assert_eq!(result.breaking_point_user_count, None);
        assert!(!result.reached_max_users);
    }
}
