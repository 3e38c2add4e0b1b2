//! Scripted collaborators for engine tests

use loadpulse_http::{ErrorCategory, RequestExecutor, RequestOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub enum Reply {
    Status(u16),
    Fail(ErrorCategory),
    Panic,
}

/// Answers the n-th call (across all users) with `script(n)` after `delay`
pub struct ScriptedExecutor<F> {
    calls: AtomicUsize,
    delay: Duration,
    script: F,
}

impl<F> ScriptedExecutor<F>
where
    F: Fn(usize) -> Reply + Send + Sync,
{
    pub fn new(delay: Duration, script: F) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            script,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl<F> RequestExecutor for ScriptedExecutor<F>
where
    F: Fn(usize) -> Reply + Send + Sync,
{
    async fn execute(&self, _target_url: &str, _timeout: Duration) -> RequestOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let dispatched_at = chrono::Utc::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match (self.script)(call) {
            Reply::Status(status) => {
                RequestOutcome::response(dispatched_at, status, self.delay / 2, self.delay)
            }
            Reply::Fail(ErrorCategory::Timeout) => RequestOutcome::timed_out(dispatched_at, "scripted timeout"),
            Reply::Fail(category) => {
                RequestOutcome::failure(dispatched_at, category, "scripted failure", self.delay)
            }
            Reply::Panic => panic!("scripted executor panic"),
        }
    }
}
