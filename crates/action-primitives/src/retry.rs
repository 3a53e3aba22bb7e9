//! Retry combinator shared by the element interactor and the wait engine

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::errors::ActionError;

/// Classifies errors the combinator may retry.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ActionError {
    fn is_retryable(&self) -> bool {
        ActionError::is_retryable(self)
    }
}

/// Bounds for [`attempt`].
///
/// Retries stop at whichever limit is hit first: the retry count or the
/// wall-clock budget measured from the first attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: Option<u32>,
    pub budget: Option<Duration>,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A single immediate retry, as used around element interaction.
    pub fn once() -> Self {
        Self {
            max_retries: Some(1),
            budget: None,
            backoff: Duration::ZERO,
        }
    }

    /// Unlimited retries separated by `backoff`, bounded by `budget`.
    pub fn budgeted(budget: Duration, backoff: Duration) -> Self {
        Self {
            max_retries: None,
            budget: Some(budget),
            backoff,
        }
    }
}

/// Per-attempt information handed to the operation.
#[derive(Clone, Copy, Debug)]
pub struct AttemptCtx {
    /// 1-based attempt number
    pub number: u32,
    /// Budget left at the start of this attempt, when the policy has one
    pub remaining: Option<Duration>,
}

impl AttemptCtx {
    pub fn is_retry(&self) -> bool {
        self.number > 1
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy is exhausted. The last error is returned unchanged.
pub async fn attempt<T, E, Op, Fut>(policy: &RetryPolicy, mut op: Op) -> Result<T, E>
where
    E: Retryable + Display,
    Op: FnMut(AttemptCtx) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let started = Instant::now();
    let mut number = 1;

    loop {
        let remaining = policy
            .budget
            .map(|budget| budget.saturating_sub(started.elapsed()));
        let ctx = AttemptCtx { number, remaining };

        let err = match op(ctx).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        let retries = number - 1;
        if policy.max_retries.is_some_and(|max| retries >= max) {
            debug!(attempts = number, "retry limit reached");
            return Err(err);
        }

        if !policy.backoff.is_zero() {
            sleep(policy.backoff).await;
        }

        if let Some(budget) = policy.budget {
            if started.elapsed() >= budget {
                debug!(attempts = number, budget_ms = budget.as_millis() as u64, "retry budget exhausted");
                return Err(err);
            }
        }

        warn!(attempt = number, error = %err, "transient failure, retrying");
        number += 1;
    }
}
