//! End-to-end monitoring run: collect, persist, re-read, evaluate, notify.
//!
//! Alerting always works on the snapshot as read back from the store, so an
//! alert-only rerun behaves exactly like the alerting half of a full run.
//! Every event a run emits is recorded inside a `monitor_run` span carrying
//! its `run_id` and `mode`.

use chrono::{DateTime, Utc};
use credwatch_core::{AppResult, RunId};
use credwatch_domain::AlertEvent;
use tracing::{Instrument, Span, info, info_span, warn};

use crate::{CredentialCollector, DispatchSummary, ExpiryEvaluator, Notifier, SnapshotStore};


/// Counters describing one monitoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorRunSummary {
    /// Run identifier.
    pub run_id: RunId,
    /// Applications listed by the directory. Zero for alert-only runs.
    pub applications_listed: usize,
    /// Applications skipped after a collection failure.
    pub applications_skipped: usize,
    /// Records in the snapshot alerting worked on.
    pub records_evaluated: usize,
    /// Alert events raised by the evaluator.
    pub alerts_raised: usize,
    /// Dispatch counters.
    pub notifications: DispatchSummary,
}

/// Sequences the monitoring pipeline.
#[derive(Clone)]
pub struct CredentialMonitorService {
    collector: CredentialCollector,
    store: SnapshotStore,
    evaluator: ExpiryEvaluator,
    notifier: Notifier,
}

impl CredentialMonitorService {
    /// Creates the service from its components.
    #[must_use]
    pub fn new(
        collector: CredentialCollector,
        store: SnapshotStore,
        evaluator: ExpiryEvaluator,
        notifier: Notifier,
    ) -> Self {
        Self {
            collector,
            store,
            evaluator,
            notifier,
        }
    }

    /// Runs the full pipeline as of `now`.
    ///
    /// A collection failure aborts before anything is written, leaving the
    /// previous snapshot untouched. Store failures are fatal as well.
    pub async fn run(&self, run_id: RunId, now: DateTime<Utc>) -> AppResult<MonitorRunSummary> {
        self.collect_and_alert(run_id, now)
            .instrument(run_span(run_id, "run"))
            .await
    }

    /// Reruns evaluation and notification against the last persisted snapshot.
    pub async fn run_alerts_only(
        &self,
        run_id: RunId,
        now: DateTime<Utc>,
    ) -> AppResult<MonitorRunSummary> {
        self.alert_only(run_id, now)
            .instrument(run_span(run_id, "alerts"))
            .await
    }

    async fn collect_and_alert(
        &self,
        run_id: RunId,
        now: DateTime<Utc>,
    ) -> AppResult<MonitorRunSummary> {
        info!(snapshot = %self.store.name(), "monitoring run started");

        let collection = self.collector.collect().await?;
        for skipped in &collection.skipped {
            warn!(
                application = %skipped.application_name,
                reason = %skipped.reason,
                "application missing from snapshot"
            );
        }

        self.store.write(&collection.snapshot).await?;

        let mut summary = self.alert_from_store(run_id, now).await?;
        summary.applications_listed = collection.applications_listed;
        summary.applications_skipped = collection.skipped.len();

        log_summary(&summary);
        Ok(summary)
    }

    async fn alert_only(&self, run_id: RunId, now: DateTime<Utc>) -> AppResult<MonitorRunSummary> {
        info!(snapshot = %self.store.name(), "alert-only run started");

        let summary = self.alert_from_store(run_id, now).await?;
        log_summary(&summary);
        Ok(summary)
    }

    async fn alert_from_store(
        &self,
        run_id: RunId,
        now: DateTime<Utc>,
    ) -> AppResult<MonitorRunSummary> {
        let snapshot = self.store.read().await?;
        let events: Vec<AlertEvent> = self.evaluator.evaluate(&snapshot, now).collect();
        info!(
            records = snapshot.records().len(),
            alerts = events.len(),
            "expiry evaluation finished"
        );

        let alerts_raised = events.len();
        let notifications = self.notifier.notify_all(events).await;

        Ok(MonitorRunSummary {
            run_id,
            applications_listed: 0,
            applications_skipped: 0,
            records_evaluated: snapshot.records().len(),
            alerts_raised,
            notifications,
        })
    }
}

fn run_span(run_id: RunId, mode: &'static str) -> Span {
    info_span!("monitor_run", run_id = %run_id, mode)
}

fn log_summary(summary: &MonitorRunSummary) {
    info!(
        applications_listed = summary.applications_listed,
        applications_skipped = summary.applications_skipped,
        records_evaluated = summary.records_evaluated,
        alerts_raised = summary.alerts_raised,
        notifications_sent = summary.notifications.sent,
        notifications_skipped = summary.notifications.skipped,
        notifications_failed = summary.notifications.failed,
        "monitoring run finished"
    );
}
