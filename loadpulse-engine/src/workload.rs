//! Workload generator: a fixed population of virtual users
//!
//! Each virtual user is one tokio task that issues its requests sequentially
//! and keeps its samples in a local buffer. Buffers are merged only after
//! every task has been joined, so the concurrent phase shares no mutable
//! state. A run-level stop signal (deadline or external cancel) is delivered
//! through a `watch` channel and observed cooperatively.

use crate::aggregator::MetricsAggregator;
use crate::error::{EngineError, EngineResult};
use crate::result::{LoadTestResult, RunWindow};
use chrono::Utc;
use loadpulse_http::{RequestExecutor, RequestOutcome, RequestSample};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

/// Parameters of one load test run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadTestParams {
    pub num_users: usize,
    pub requests_per_user: usize,
    pub ramp_up: Duration,
    pub think_time: Duration,
    /// Per-request timeout handed to the executor
    pub timeout: Duration,
    /// Global wall-clock deadline for the whole run
    pub max_duration: Option<Duration>,
}

impl LoadTestParams {
    pub fn validate(&self) -> EngineResult<()> {
        if self.num_users == 0 {
            return Err(EngineError::invalid("num_users", "must be at least 1"));
        }
        if self.requests_per_user == 0 {
            return Err(EngineError::invalid("requests_per_user", "must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(EngineError::invalid("timeout", "must be greater than 0"));
        }
        if matches!(self.max_duration, Some(d) if d.is_zero()) {
            return Err(EngineError::invalid("max_duration", "must be greater than 0"));
        }
        Ok(())
    }
}

/// A finished run: the aggregate plus the raw samples for persistence
#[derive(Debug, Clone)]
pub struct LoadTestRun {
    pub result: LoadTestResult,
    /// Ordered by `(user_index, sequence_index)`
    pub samples: Vec<RequestSample>,
}

/// Something that can execute a load test; the stress controller drives this
#[async_trait::async_trait]
pub trait LoadRunner: Send + Sync {
    async fn run(&self, params: &LoadTestParams) -> EngineResult<LoadTestRun>;

    fn target_url(&self) -> &str;
}

/// Why a run stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Deadline,
    Cancelled,
}

impl StopReason {
    fn message(&self) -> &'static str {
        match self {
            StopReason::Deadline => "cancelled by run deadline",
            StopReason::Cancelled => "cancelled by operator",
        }
    }
}

/// Cloneable handle that stops in-flight runs from outside (e.g. on Ctrl-C)
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Start offset of virtual user `user_index`: `i * ramp_up / num_users`
pub fn ramp_up_offset(user_index: usize, num_users: usize, ramp_up: Duration) -> Duration {
    if num_users == 0 || ramp_up.is_zero() {
        return Duration::ZERO;
    }
    let nanos = ramp_up.as_nanos() * user_index as u128 / num_users as u128;
    Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
}

/// Spawns virtual users against one target through a shared executor
pub struct WorkloadGenerator {
    executor: Arc<dyn RequestExecutor>,
    target_url: Arc<str>,
    cancel: CancelHandle,
}

impl WorkloadGenerator {
    pub fn new(executor: Arc<dyn RequestExecutor>, target_url: impl Into<String>) -> Self {
        Self {
            executor,
            target_url: Arc::from(target_url.into()),
            cancel: CancelHandle::new(),
        }
    }

    /// Use an externally owned cancel handle
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run one load test to completion, deadline or cancellation
    pub async fn run(&self, params: &LoadTestParams) -> EngineResult<LoadTestRun> {
        params.validate()?;

        info!(
            url = %self.target_url,
            users = params.num_users,
            requests_per_user = params.requests_per_user,
            ramp_up_secs = params.ramp_up.as_secs_f64(),
            think_time_ms = params.think_time.as_millis() as u64,
            "Starting load test"
        );

        let started_at = Utc::now();
        let clock = Instant::now();
        let deadline = params.max_duration.map(|limit| clock + limit);

        let (stop_tx, stop_rx) = watch::channel(None);
        let mut users = JoinSet::new();
        for user_index in 0..params.num_users {
            users.spawn(virtual_user(
                user_index,
                *params,
                ramp_up_offset(user_index, params.num_users, params.ramp_up),
                Arc::clone(&self.executor),
                Arc::clone(&self.target_url),
                stop_rx.clone(),
            ));
        }
        drop(stop_rx);

        let mut external = self.cancel.subscribe();
        let mut stopping = false;
        let mut buffers = Vec::with_capacity(params.num_users);

        loop {
            tokio::select! {
                joined = users.join_next() => match joined {
                    Some(buffer) => buffers.push(buffer?),
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or(clock)), if !stopping && deadline.is_some() => {
                    warn!(users_running = users.len(), "Run deadline reached, cancelling virtual users");
                    stop_tx.send_replace(Some(StopReason::Deadline));
                    stopping = true;
                }
                _ = cancelled(&mut external), if !stopping => {
                    warn!(users_running = users.len(), "Run cancelled, stopping virtual users");
                    stop_tx.send_replace(Some(StopReason::Cancelled));
                    stopping = true;
                }
            }
        }

        let mut elapsed = clock.elapsed();
        if let Some(limit) = params.max_duration {
            elapsed = elapsed.min(limit);
        }

        let mut samples: Vec<RequestSample> = buffers.into_iter().flatten().collect();
        samples.sort_by_key(|s| (s.user_index(), s.sequence_index()));

        let window = RunWindow::new(started_at, elapsed);
        let result = MetricsAggregator::aggregate(&samples, &window).with_run_info(
            &*self.target_url,
            params.num_users,
            params.requests_per_user,
        );

        info!(
            total_requests = result.total_requests,
            success_rate = result.success_rate,
            throughput_rps = result.throughput_rps,
            p95_ms = result.latency.p95_ms,
            "Load test finished"
        );

        Ok(LoadTestRun { result, samples })
    }
}

#[async_trait::async_trait]
impl LoadRunner for WorkloadGenerator {
    async fn run(&self, params: &LoadTestParams) -> EngineResult<LoadTestRun> {
        WorkloadGenerator::run(self, params).await
    }

    fn target_url(&self) -> &str {
        &self.target_url
    }
}

async fn virtual_user(
    user_index: usize,
    params: LoadTestParams,
    start_offset: Duration,
    executor: Arc<dyn RequestExecutor>,
    target_url: Arc<str>,
    mut stop: watch::Receiver<Option<StopReason>>,
) -> Vec<RequestSample> {
    let mut samples = Vec::with_capacity(params.requests_per_user);

    if !start_offset.is_zero() {
        tokio::select! {
            _ = sleep(start_offset) => {}
            _ = stopped(&mut stop) => return samples,
        }
    }
    debug!(user = user_index, "Virtual user released");

    for sequence_index in 0..params.requests_per_user {
        if stop.borrow().is_some() {
            break;
        }

        if sequence_index > 0 && !params.think_time.is_zero() {
            tokio::select! {
                _ = sleep(params.think_time) => {}
                _ = stopped(&mut stop) => break,
            }
        }

        let dispatched_at = Utc::now();
        tokio::select! {
            biased;
            outcome = executor.execute(&target_url, params.timeout) => {
                samples.push(RequestSample::new(user_index, sequence_index, outcome));
            }
            reason = stopped(&mut stop) => {
                let outcome = RequestOutcome::timed_out(dispatched_at, reason.message());
                samples.push(RequestSample::new(user_index, sequence_index, outcome));
                break;
            }
        }
    }

    samples
}

/// Resolves once the run has been told to stop
async fn stopped(stop: &mut watch::Receiver<Option<StopReason>>) -> StopReason {
    let reason = match stop.wait_for(Option::is_some).await {
        Ok(reason) => *reason,
        Err(_) => None,
    };
    match reason {
        Some(reason) => reason,
        // Sender gone: the run is over and nobody will signal a stop.
        None => std::future::pending().await,
    }
}

/// Resolves once the external handle has been cancelled
async fn cancelled(handle: &mut watch::Receiver<bool>) {
    let closed = handle.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
