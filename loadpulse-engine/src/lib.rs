//! Load generation and performance measurement for loadpulse
//!
//! - [`WorkloadGenerator`] drives a fixed population of virtual users
//! - [`MetricsAggregator`] turns the joined sample set into a [`LoadTestResult`]
//! - [`StressController`] repeats load runs at increasing concurrency until the
//!   target breaks or `max_users` is reached
//!
//! Only configuration errors leave the engine as `Err`; request failures and
//! degraded runs are reported as data.

pub mod aggregator;
pub mod error;
pub mod result;
pub mod stress;
pub mod workload;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::{percentile, MetricsAggregator};
pub use error::{EngineError, EngineResult};
pub use result::{LatencyStats, LoadTestResult, RunWindow, StressLevel, StressTestResult};
pub use stress::{StressController, StressRun, StressTestParams};
pub use workload::{
    ramp_up_offset, CancelHandle, LoadRunner, LoadTestParams, LoadTestRun, WorkloadGenerator,
};

use loadpulse_config::{HttpConfig, LoadTestConfig, StressTestConfig, TargetSettings};
use loadpulse_http::{HttpExecutor, HttpMethod};
use std::sync::Arc;
use std::time::Duration;

/// Run a load test described by configuration
pub async fn run_load_test(
    target: &dyn TargetSettings,
    http: &HttpConfig,
    config: &LoadTestConfig,
) -> EngineResult<LoadTestRun> {
    run_load_test_with_cancel(target, http, config, CancelHandle::new()).await
}

/// [`run_load_test`] with a caller-owned cancel handle
pub async fn run_load_test_with_cancel(
    target: &dyn TargetSettings,
    http: &HttpConfig,
    config: &LoadTestConfig,
    cancel: CancelHandle,
) -> EngineResult<LoadTestRun> {
    let params = load_params(target, config)?;
    let generator = build_generator(target, http, params.num_users)?.with_cancel_handle(cancel);
    generator.run(&params).await
}

/// Run a stress sweep described by configuration
pub async fn run_stress_test(
    target: &dyn TargetSettings,
    http: &HttpConfig,
    config: &StressTestConfig,
) -> EngineResult<StressRun> {
    run_stress_test_with_cancel(target, http, config, CancelHandle::new()).await
}

/// [`run_stress_test`] with a caller-owned cancel handle
pub async fn run_stress_test_with_cancel(
    target: &dyn TargetSettings,
    http: &HttpConfig,
    config: &StressTestConfig,
    cancel: CancelHandle,
) -> EngineResult<StressRun> {
    let params = stress_params(target, config)?;
    let generator = build_generator(target, http, params.max_users)?.with_cancel_handle(cancel.clone());
    StressController::new(Arc::new(generator))
        .with_cancel_handle(cancel)
        .run_sweep(&params)
        .await
}

/// Translate the `load` config domain into run parameters
pub fn load_params(target: &dyn TargetSettings, config: &LoadTestConfig) -> EngineResult<LoadTestParams> {
    let params = LoadTestParams {
        num_users: config.num_users,
        requests_per_user: config.requests_per_user,
        ramp_up: config.ramp_up,
        think_time: config.think_time,
        timeout: resolve_timeout(target, config.timeout)?,
        max_duration: config.max_duration,
    };
    params.validate()?;
    Ok(params)
}

/// Translate the `stress` config domain into sweep parameters
pub fn stress_params(
    target: &dyn TargetSettings,
    config: &StressTestConfig,
) -> EngineResult<StressTestParams> {
    let params = StressTestParams {
        max_users: config.max_users,
        increment_users: config.increment_users,
        requests_per_increment: config.requests_per_increment,
        break_threshold_percent: config.break_threshold_percent,
        ramp_up: config.ramp_up,
        think_time: config.think_time,
        timeout: resolve_timeout(target, config.timeout)?,
    };
    params.validate()?;
    Ok(params)
}

fn resolve_timeout(target: &dyn TargetSettings, timeout: Option<Duration>) -> EngineResult<Duration> {
    if let Some(timeout) = timeout {
        return Ok(timeout);
    }
    let seconds = target.default_timeout_seconds();
    Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| EngineError::invalid("default_timeout", format!("{} is not a usable timeout", seconds)))
}

fn build_generator(
    target: &dyn TargetSettings,
    http: &HttpConfig,
    concurrent_users: usize,
) -> EngineResult<WorkloadGenerator> {
    if target.target_url().trim().is_empty() {
        return Err(EngineError::invalid("target_url", "cannot be empty"));
    }
    let method: HttpMethod = target.method().parse()?;
    let executor = HttpExecutor::new(http, method, concurrent_users)?;
    Ok(WorkloadGenerator::new(Arc::new(executor), target.target_url()))
}
