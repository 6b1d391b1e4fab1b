use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use credwatch_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::CredentialRecord;

/// Milestones used when no alert-day set is configured.
pub const DEFAULT_ALERT_DAYS: [i64; 10] = [1, 2, 3, 4, 5, 6, 7, 15, 30, 89];

/// Whole UTC calendar days from `now` until `expiry_date`.
///
/// The time of day of `now` is discarded, so any instant on the day before
/// expiry yields `1` and any instant on the expiry day yields `0`.
#[must_use]
pub fn days_until(expiry_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    expiry_date
        .signed_duration_since(now.date_naive())
        .num_days()
}

/// Set of "days remaining" values that each trigger exactly one alert.
///
/// Membership is exact: a credential 29 days from expiry does not match a
/// set that only contains 30.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDays(BTreeSet<i64>);

impl AlertDays {
    /// Creates a validated alert-day set.
    pub fn new(days: impl IntoIterator<Item = i64>) -> AppResult<Self> {
        let days: BTreeSet<i64> = days.into_iter().collect();
        if days.is_empty() {
            return Err(AppError::Validation(
                "alert day set must contain at least one value".to_owned(),
            ));
        }

        if let Some(negative) = days.iter().find(|day| **day < 0) {
            return Err(AppError::Validation(format!(
                "alert day {negative} must be greater than or equal to zero"
            )));
        }

        Ok(Self(days))
    }

    /// Returns whether an alert fires for the given days remaining.
    #[must_use]
    pub fn contains(&self, days_left: i64) -> bool {
        self.0.contains(&days_left)
    }

    /// Iterates configured milestones in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }
}

impl Default for AlertDays {
    fn default() -> Self {
        Self(DEFAULT_ALERT_DAYS.into_iter().collect())
    }
}

impl FromStr for AlertDays {
    type Err = AppError;

    /// Parses a comma-separated list such as `1,7,30`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let days = value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>().map_err(|error| {
                    AppError::Validation(format!("invalid alert day '{part}': {error}"))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Self::new(days)
    }
}

/// A credential record that reached one of the configured milestones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    record: CredentialRecord,
    days_left: i64,
}

impl AlertEvent {
    /// Pairs a record with the computed days remaining.
    #[must_use]
    pub fn new(record: CredentialRecord, days_left: i64) -> Self {
        Self { record, days_left }
    }

    /// Returns the triggering record.
    #[must_use]
    pub fn record(&self) -> &CredentialRecord {
        &self.record
    }

    /// Returns whole days remaining until expiry.
    #[must_use]
    pub fn days_left(&self) -> i64 {
        self.days_left
    }
}
