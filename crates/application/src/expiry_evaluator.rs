use chrono::{DateTime, Utc};
use credwatch_domain::{AlertDays, AlertEvent, Snapshot, days_until};

/// Lazily yields an [`AlertEvent`] for every record whose days remaining is
/// exactly one of `alert_days`.
///
/// The iterator borrows the snapshot and holds no other state, so evaluating
/// the same snapshot at the same `now` always yields the same sequence.
pub fn evaluate_expiry<'a>(
    snapshot: &'a Snapshot,
    now: DateTime<Utc>,
    alert_days: &'a AlertDays,
) -> impl Iterator<Item = AlertEvent> + 'a {
    snapshot.records().iter().filter_map(move |record| {
        let days_left = days_until(record.expiry_date(), now);
        alert_days
            .contains(days_left)
            .then(|| AlertEvent::new(record.clone(), days_left))
    })
}

/// Expiry evaluation bound to a configured alert-day set.
#[derive(Debug, Clone, Default)]
pub struct ExpiryEvaluator {
    alert_days: AlertDays,
}

impl ExpiryEvaluator {
    /// Creates an evaluator for the given milestones.
    #[must_use]
    pub fn new(alert_days: AlertDays) -> Self {
        Self { alert_days }
    }

    /// Returns the configured milestones.
    #[must_use]
    pub fn alert_days(&self) -> &AlertDays {
        &self.alert_days
    }

    /// Evaluates `snapshot` as of `now`.
    pub fn evaluate<'a>(
        &'a self,
        snapshot: &'a Snapshot,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = AlertEvent> + 'a {
        evaluate_expiry(snapshot, now, &self.alert_days)
    }
}
