//! Exponential backoff for fallible async operations.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// How many times to try and how long to wait in between.
///
/// The wait doubles after every failure. There is no jitter and no cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first call
    pub attempts: u32,
    /// Wait before the first retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    /// Wait before retry number `retry_index` (0-based).
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let multiplier = 1u32.checked_shl(retry_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier)
    }
}

/// Runs `op` until it succeeds or the policy's attempts are used up.
///
/// On exhaustion the last error is returned untouched. With `attempts = 3`
/// a permanently failing `op` is called exactly three times, sleeping
/// `base_delay` and then `2 × base_delay` in between.
pub async fn retry<F, Fut, T, E>(policy: RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_when(policy, op, |_| true).await
}

/// Like [`retry`], but gives up at once when `should_retry` rejects an error.
pub async fn retry_when<F, Fut, T, E, P>(
    policy: RetryPolicy,
    mut op: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let mut attempts_left = policy.attempts.max(1);
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempts_left <= 1 || !should_retry(&err) => return Err(err),
            Err(err) => {
                let delay = policy.delay_for(attempt - 1);
                tracing::warn!(
                    attempt,
                    attempts_left = attempts_left - 1,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "[RetryScheduler] Attempt failed, retrying"
                );
                sleep(delay).await;
                attempts_left -= 1;
                attempt += 1;
            }
        }
    }
}
