//! Retry loop: run an async operation until success, exhaustion or cancellation.

use std::future::Future;
use std::time::Duration;

use super::policy::{RetryDecision, RetryPolicy};
use crate::control::CancelToken;

/// What the loop does after a failed attempt; reported to the failure observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Wait this long, then make the next attempt.
    Retry(Duration),
    /// No attempts left; the error is returned.
    Exhausted,
    /// Cancellation was requested; the error is returned without waiting.
    Cancelled,
}

/// Final result of a retried operation and how many attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Runs `op(attempt)` until it succeeds or the policy says to stop.
///
/// On failure the cancel token is checked before waiting, and the backoff
/// wait itself is cut short by cancellation; in both cases the last error is
/// returned unchanged. `on_failure` sees every failed attempt (1-based) with
/// the step the loop is about to take.
pub async fn run_with_retry<T, E, F, Fut, O>(
    policy: &RetryPolicy,
    cancel: &CancelToken,
    mut on_failure: O,
    mut op: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    O: FnMut(u32, &E, NextStep),
{
    let mut attempt = 1u32;
    loop {
        let err = match op(attempt).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(e) => e,
        };

        let step = match policy.decide(attempt) {
            RetryDecision::NoRetry => NextStep::Exhausted,
            RetryDecision::RetryAfter(_) if cancel.is_cancelled() => NextStep::Cancelled,
            RetryDecision::RetryAfter(d) => NextStep::Retry(d),
        };
        on_failure(attempt, &err, step);

        match step {
            NextStep::Retry(delay) => {
                if cancel.sleep(delay).await.is_err() {
                    tracing::debug!(attempt, "backoff interrupted by cancellation");
                    return RetryOutcome {
                        result: Err(err),
                        attempts: attempt,
                    };
                }
                attempt += 1;
            }
            NextStep::Exhausted | NextStep::Cancelled => {
                return RetryOutcome {
                    result: Err(err),
                    attempts: attempt,
                }
            }
        }
    }
}
