//! Explicit retry policy for provider calls
//!
//! The retry contract is a value, not a wrapper: maximum attempts, an
//! exponential backoff schedule clamped to a floor and ceiling, and a
//! retryable-error predicate supplied at the call site. Only rate-limit
//! signals are retried; auth and other errors propagate immediately.

use std::future::Future;
use std::time::Duration;

/// Backoff schedule: `base * 2^(attempt - 1)`, clamped to
/// `[floor, ceiling]`, slept between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub floor: Duration,
    pub ceiling: Duration,
}

impl Default for RetryPolicy {
    /// 3 attempts total, exponential from 1s, between 2s and 10s.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(1),
            floor: Duration::from_secs(2),
            ceiling: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay slept after the given (1-indexed) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let raw = self.base.saturating_mul(2_u32.pow(exp));
        raw.clamp(self.floor, self.ceiling)
    }

    /// Run `operation`, retrying while `retryable` holds and attempts
    /// remain. The final error is returned unchanged.
    pub async fn run<T, E, F, Fut, P>(&self, mut operation: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts || !retryable(&err) {
                        return Err(err);
                    }
                    tokio::time::sleep(self.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
