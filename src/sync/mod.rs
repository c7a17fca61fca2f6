//! Sync driver: one pass over the mailbox, reconciling each job email.
//!
//! Per pass:
//! 1. `search_ids()` with the job query, bounded by the pass cap
//! 2. `get_message()` + `parse_message()` per id (failures are skipped)
//! 3. `Reconciler::reconcile()`, then the per-record pause
//!
//! `scheduler` repeats passes on a timer.

pub mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::MailboxError;
use crate::mailbox::{JOB_SEARCH_QUERY, Mailbox, search_ids};
use crate::pipeline::parser::parse_message;
use crate::pipeline::{ReconcileOutcome, Reconciler};
use crate::store::RecordStore;

pub use scheduler::spawn_sync_loop;

/// Log progress every this many messages.
const PROGRESS_EVERY: usize = 10;

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Ids returned by the search.
    pub listed: usize,
    /// Messages fetched and parsed into candidates.
    pub parsed: usize,
    /// Messages dropped before reconciliation (fetch or parse failure).
    pub skipped: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl PassReport {
    fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Created => self.created += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::Unchanged => self.unchanged += 1,
            ReconcileOutcome::Failed => self.failed += 1,
        }
    }
}

pub struct SyncDriver {
    mailbox: Arc<dyn Mailbox>,
    reconciler: Reconciler,
    account_email: String,
    record_delay: Duration,
}

impl SyncDriver {
    pub fn new(
        mailbox: Arc<dyn Mailbox>,
        store: Arc<dyn RecordStore>,
        account_email: impl Into<String>,
        record_delay: Duration,
    ) -> Self {
        let account_email = account_email.into();
        Self {
            mailbox,
            reconciler: Reconciler::new(store, account_email.clone()),
            account_email,
            record_delay,
        }
    }

    /// Run one pass over at most `cap` matching messages.
    ///
    /// Only the search itself can fail the pass; per-message problems are
    /// logged and counted.
    pub async fn run_pass(&self, cap: usize) -> Result<PassReport, MailboxError> {
        let ids = search_ids(self.mailbox.as_ref(), JOB_SEARCH_QUERY, cap).await?;
        let mut report = PassReport {
            listed: ids.len(),
            ..PassReport::default()
        };

        if ids.is_empty() {
            info!("No new job emails found");
            return Ok(report);
        }

        info!(count = ids.len(), "Found job-related emails");

        for (i, id) in ids.iter().enumerate() {
            if i > 0 && i % PROGRESS_EVERY == 0 {
                info!("Processed {i}/{} emails", ids.len());
            }

            let raw = match self.mailbox.get_message(id).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to fetch message, skipping");
                    report.skipped += 1;
                    continue;
                }
            };

            let candidate = match parse_message(&raw, &self.account_email, Utc::now()) {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to parse message, skipping");
                    report.skipped += 1;
                    continue;
                }
            };
            report.parsed += 1;

            debug!(id = %id, subject = %candidate.subject, status = %candidate.status, "Parsed");
            report.record(self.reconciler.reconcile(&candidate).await);

            if !self.record_delay.is_zero() {
                tokio::time::sleep(self.record_delay).await;
            }
        }

        if report.created == 0 {
            info!(
                updated = report.updated,
                unchanged = report.unchanged,
                "No new job emails found"
            );
        } else {
            info!(
                created = report.created,
                updated = report.updated,
                unchanged = report.unchanged,
                failed = report.failed,
                skipped = report.skipped,
                "Synced {} new job emails",
                report.created
            );
        }

        Ok(report)
    }
}
