//! Exponential backoff for throttled remote calls.
//!
//! Only `AppError::Throttled` is retried. The delay before retry `n`
//! (zero-based) is `min(2^n * base_delay, cap_delay)` with no jitter, so the
//! schedule for the defaults is 1s, 2s, 4s. Any other error is returned to
//! the caller unchanged.

use std::future::Future;
use std::time::Duration;

use credwatch_core::{AppError, AppResult};
use tracing::{debug, warn};

/// Backoff limits for throttled calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    cap_delay: Duration,
}

impl RetryPolicy {
    /// Default number of retries after the initial attempt.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Default delay before the first retry.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
    /// Default ceiling for any single delay.
    pub const DEFAULT_CAP_DELAY: Duration = Duration::from_secs(8);

    /// Creates a validated retry policy.
    pub fn new(max_retries: u32, base_delay: Duration, cap_delay: Duration) -> AppResult<Self> {
        if cap_delay < base_delay {
            return Err(AppError::Validation(format!(
                "retry cap delay {}ms must not be below base delay {}ms",
                cap_delay.as_millis(),
                base_delay.as_millis()
            )));
        }

        Ok(Self {
            max_retries,
            base_delay,
            cap_delay,
        })
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            cap_delay: Duration::ZERO,
        }
    }

    /// Returns the number of retries allowed after the initial attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the delay before zero-based retry `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.cap_delay)
            .min(self.cap_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            base_delay: Self::DEFAULT_BASE_DELAY,
            cap_delay: Self::DEFAULT_CAP_DELAY,
        }
    }
}

/// Runs remote calls under a [`RetryPolicy`].
///
/// The client holds no shared state: every `execute` call keeps its own
/// attempt counter, so concurrent throttled calls back off independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryingClient {
    policy: RetryPolicy,
}

impl RetryingClient {
    /// Creates a client for the given policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Executes `call`, retrying while it reports throttling.
    ///
    /// Returns `AppError::TransientFailure` once the retry budget is spent.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut call: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0_u32;

        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            operation = operation,
                            retries = attempt,
                            "remote call succeeded after throttling"
                        );
                    }
                    return Ok(value);
                }
                Err(error) if error.is_throttled() => {
                    if attempt >= self.policy.max_retries {
                        return Err(AppError::TransientFailure(format!(
                            "{operation} still throttled after {attempt} retries: {error}"
                        )));
                    }

                    let delay = self.policy.delay_for(attempt);
                    attempt = attempt.saturating_add(1);
                    warn!(
                        operation = operation,
                        attempt = attempt,
                        max_retries = self.policy.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "remote call throttled, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
