use std::time::Duration;

use credwatch_core::{AppError, AppResult};
use credwatch_domain::AlertDays;

use crate::RetryPolicy;

/// Tunable options of a monitoring run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Days-remaining milestones that trigger an alert.
    pub alert_days: AlertDays,
    /// Retries allowed after a throttled call.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Ceiling for a single retry delay, in milliseconds.
    pub cap_delay_ms: u64,
    /// Applications collected concurrently.
    pub collector_concurrency: usize,
    /// Alerts dispatched concurrently.
    pub notifier_concurrency: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            alert_days: AlertDays::default(),
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            base_delay_ms: 1_000,
            cap_delay_ms: 8_000,
            collector_concurrency: 4,
            notifier_concurrency: 4,
        }
    }
}

impl MonitorConfig {
    /// Builds the retry policy described by this configuration.
    pub fn retry_policy(&self) -> AppResult<RetryPolicy> {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.cap_delay_ms),
        )
    }

    /// Checks invariants that cannot be expressed in the field types.
    pub fn validate(&self) -> AppResult<()> {
        if self.collector_concurrency == 0 {
            return Err(AppError::Validation(
                "collector concurrency must be greater than zero".to_owned(),
            ));
        }

        if self.notifier_concurrency == 0 {
            return Err(AppError::Validation(
                "notifier concurrency must be greater than zero".to_owned(),
            ));
        }

        self.retry_policy().map(|_| ())
    }
}
