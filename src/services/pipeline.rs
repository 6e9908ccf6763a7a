//! One monitoring pass over the selected categories, strictly in sequence.

use crate::cninfo::{FetchOutcome, Fetcher};
use crate::domain::models::{
    Category, CategoryReport, FetchStatus, NotifyStatus, RunReport, Table,
};
use crate::services::differ::diff;
use crate::services::message::Formatter;
use crate::services::notifier::{Notifier, SendOutcome};
use crate::services::recency::filter_recent;
use crate::services::snapshot::SnapshotStore;
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

pub struct Pipeline<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub notifier: &'a dyn Notifier,
    pub store: &'a SnapshotStore,
    pub formatter: &'a Formatter,
    pub window_days: u32,
}

impl Pipeline<'_> {
    /// Process `categories` in order. Failures stay inside their category.
    pub fn run(&self, categories: &[Category], today: NaiveDate) -> RunReport {
        let reports: Vec<CategoryReport> = categories
            .iter()
            .map(|&category| self.run_category(category, today))
            .collect();

        let report = RunReport {
            as_of: today,
            window_days: self.window_days,
            kind: self.formatter.kind(),
            new_records: reports.iter().map(|r| r.delta_rows).sum(),
            fetch_failures: reports
                .iter()
                .filter(|r| r.fetch_status == FetchStatus::Failed)
                .count(),
            notify_failures: reports
                .iter()
                .filter(|r| {
                    matches!(r.notify_status, NotifyStatus::Rejected | NotifyStatus::Failed)
                })
                .count(),
            categories: reports,
        };
        info!(
            new_records = report.new_records,
            fetch_failures = report.fetch_failures,
            notify_failures = report.notify_failures,
            "run finished"
        );
        report
    }

    pub fn run_category(&self, category: Category, today: NaiveDate) -> CategoryReport {
        let outcome = self.fetcher.fetch(category);
        let (fetch_status, fetch_error) = match &outcome {
            FetchOutcome::Fetched(_) => (FetchStatus::Ok, None),
            FetchOutcome::Failed { reason } => (FetchStatus::Failed, Some(reason.clone())),
        };
        let fetched = outcome.into_table();

        let old_table = self.store.load(category).unwrap_or_else(|e| {
            warn!(%category, error = %e, "unreadable snapshot, using empty baseline");
            Table::new()
        });

        let recent = filter_recent(&fetched, self.window_days, today);
        let notifiable_delta = diff(&recent, &old_table);
        info!(
            %category,
            fetched = fetched.len(),
            recent = recent.len(),
            new = notifiable_delta.len(),
            "diffed against snapshot"
        );

        let (notify_status, notify_error) = if notifiable_delta.is_empty() {
            (NotifyStatus::Skipped, None)
        } else {
            let message = self.formatter.render(category, &notifiable_delta);
            let sent = self.notifier.send(&message);
            let status = match &sent {
                SendOutcome::Delivered => NotifyStatus::Delivered,
                SendOutcome::Rejected { .. } => NotifyStatus::Rejected,
                SendOutcome::Failed { .. } => NotifyStatus::Failed,
            };
            (status, sent.describe())
        };

        // The baseline for the next run is the whole fetch, not the window.
        let persisted_snapshot = fetched;
        let mut report = CategoryReport {
            category,
            title: category.title().to_string(),
            fetch_status,
            fetch_error,
            fetched_rows: persisted_snapshot.len(),
            recent_rows: recent.len(),
            delta_rows: notifiable_delta.len(),
            notify_status,
            notify_error,
            snapshot_saved: false,
            snapshot_rows: 0,
            snapshot_sha256: None,
            snapshot_error: None,
        };
        match self.store.save(category, &persisted_snapshot) {
            Ok(saved) => {
                debug!(%category, path = %saved.path.display(), sha256 = %saved.sha256, "snapshot replaced");
                report.snapshot_saved = true;
                report.snapshot_rows = saved.rows;
                report.snapshot_sha256 = Some(saved.sha256);
            }
            Err(e) => {
                error!(%category, error = %e, "snapshot save failed");
                report.snapshot_error = Some(e.to_string());
            }
        }
        report
    }
}
