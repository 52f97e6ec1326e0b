use std::time::Duration;

/// Decision returned by the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Attempts exhausted; give up with the last error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Rejected policy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("max_attempts must be at least 1")]
pub struct InvalidRetryPolicy;

/// Bounded retry with linear backoff: after attempt `k` fails, wait `base_delay * k`.
///
/// Every failure kind is retried the same way; a 429 does not get a longer wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` includes the first attempt and must be at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Result<Self, InvalidRetryPolicy> {
        if max_attempts == 0 {
            return Err(InvalidRetryPolicy);
        }
        Ok(Self {
            max_attempts,
            base_delay,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Decide what to do after `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.base_delay.saturating_mul(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_attempts_rejected() {
        assert_eq!(
            RetryPolicy::new(0, Duration::from_secs(1)),
            Err(InvalidRetryPolicy)
        );
    }

    #[test]
    fn default_is_three_attempts_one_second_base() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts(), 3);
        assert_eq!(p.base_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn linear_backoff_uses_completed_attempt_index() {
        let p = RetryPolicy::new(5, Duration::from_millis(1000)).unwrap();
        for k in 1..5 {
            assert_eq!(
                p.decide(k),
                RetryDecision::RetryAfter(Duration::from_millis(1000 * u64::from(k)))
            );
        }
        assert_eq!(p.decide(5), RetryDecision::NoRetry);
    }

    #[test]
    fn single_attempt_never_retries() {
        let p = RetryPolicy::new(1, Duration::from_millis(1000)).unwrap();
        assert_eq!(p.decide(1), RetryDecision::NoRetry);
    }
}
