//! Budgeted polling waits

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::errors::ActionError;
use crate::retry::{attempt, RetryPolicy};
use crate::types::WaitPolicy;

/// Polls boolean conditions until they hold or a wall-clock budget runs out.
///
/// A condition that returns a transient driver error does not fail the
/// wait: the engine sleeps one throttle interval and polls again with the
/// budget that is left. Total blocking never exceeds the timeout plus one
/// throttle interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitEngine {
    policy: WaitPolicy,
}

impl WaitEngine {
    pub fn new(policy: WaitPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Wait using the policy's default timeout.
    pub async fn wait_until_default<F, Fut>(
        &self,
        reason: Option<&str>,
        condition: F,
    ) -> Result<(), ActionError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<bool, ActionError>> + Send,
    {
        self.wait_until(reason, self.policy.default_timeout(), condition)
            .await
    }

    pub async fn wait_until<F, Fut>(
        &self,
        reason: Option<&str>,
        timeout: Duration,
        condition: F,
    ) -> Result<(), ActionError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<bool, ActionError>> + Send,
    {
        let reason = reason.unwrap_or("condition");
        let timeout_ms = timeout.as_millis() as u64;
        let started = Instant::now();
        debug!(reason, timeout_ms, "waiting");

        let policy = RetryPolicy::budgeted(timeout, self.policy.throttle());
        let condition = &condition;
        let result = attempt(&policy, move |ctx| async move {
            let remaining = ctx.remaining.unwrap_or(timeout);
            self.poll(reason, timeout_ms, remaining, condition).await
        })
        .await;

        match result {
            Ok(()) => {
                info!(
                    reason,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "wait condition met"
                );
                Ok(())
            }
            Err(err) if err.is_retryable() => {
                warn!(reason, timeout_ms, error = %err, "wait budget exhausted by transient errors");
                Err(ActionError::timeout(reason, timeout_ms, Some(err.to_string())))
            }
            Err(err) => Err(err),
        }
    }

    /// Evaluate `condition` every poll interval until it holds or `remaining`
    /// elapses. Errors from the condition end the attempt immediately.
    async fn poll<F, Fut>(
        &self,
        reason: &str,
        timeout_ms: u64,
        remaining: Duration,
        condition: &F,
    ) -> Result<(), ActionError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<bool, ActionError>>,
    {
        let deadline = Instant::now() + remaining;
        loop {
            if condition().await? {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ActionError::timeout(reason, timeout_ms, None));
            }
            sleep(self.policy.poll_interval().min(deadline - now)).await;
        }
    }

    /// Fixed sleep, logged so post-action pauses show up in traces.
    pub async fn pause(&self, reason: &str, duration: Duration) {
        info!(reason, duration_ms = duration.as_millis() as u64, "pausing");
        sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DriverError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn engine() -> WaitEngine {
        WaitEngine::new(WaitPolicy {
            default_timeout_ms: 2_000,
            throttle_ms: 200,
            poll_interval_ms: 100,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn false_condition_times_out_within_budget() {
        let engine = engine();
        let started = Instant::now();

        let err = engine
            .wait_until(Some("never"), Duration::from_secs(2), || async { Ok(false) })
            .await
            .unwrap_err();

        let elapsed = started.elapsed();
        assert!(err.is_timeout());
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_millis(2_200));
    }

    #[tokio::test(start_paused = true)]
    async fn one_transient_error_is_retried_then_succeeds() {
        let engine = engine();
        let calls = AtomicU32::new(0);
        let calls = &calls;

        engine
            .wait_until(Some("ready"), Duration::from_secs(2), || async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(DriverError::StaleElement("q".into()).into()),
                    _ => Ok(true),
                }
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_transient_errors_become_timeout() {
        let engine = engine();
        let started = Instant::now();

        let err = engine
            .wait_until(Some("flaky"), Duration::from_secs(1), || async {
                Err(DriverError::Navigating("reload".into()).into())
            })
            .await
            .unwrap_err();

        match err {
            ActionError::HardTimeout { cause, .. } => assert!(cause.unwrap().contains("reload")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(started.elapsed() < Duration::from_millis(1_200));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_condition_error_propagates_immediately() {
        let engine = engine();
        let started = Instant::now();

        let err = engine
            .wait_until(None, Duration::from_secs(5), || async {
                Err(DriverError::Session("gone".into()).into())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::Driver(DriverError::Session(_))));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn condition_true_after_polling() {
        let engine = engine();
        let calls = AtomicU32::new(0);
        let calls = &calls;

        engine
            .wait_until_default(Some("third poll"), || async move {
                Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2)
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
