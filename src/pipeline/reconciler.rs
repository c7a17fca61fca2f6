//! Reconciler. Upserts one candidate into the record store with as few
//! writes as possible.
//!
//! 1. Look up records by subject.
//! 2. Lookup failed → fall through to create (may duplicate, never drops).
//! 3. Matches → update each one whose status differs or whose link is stale.
//! 4. No match → create.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::pipeline::parser::is_stale_permalink;
use crate::pipeline::types::{CandidateRecord, ReconcileOutcome};
use crate::store::{RecordStore, RecordUpdate, StoredRecord};

pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    account_email: String,
}

impl Reconciler {
    pub fn new(store: Arc<dyn RecordStore>, account_email: impl Into<String>) -> Self {
        Self {
            store,
            account_email: account_email.into(),
        }
    }

    /// Bring the store in line with `candidate`.
    pub async fn reconcile(&self, candidate: &CandidateRecord) -> ReconcileOutcome {
        let existing = match self.store.find_by_subject(&candidate.subject).await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    subject = %candidate.subject,
                    error = %e,
                    "Lookup failed, creating without dedup check"
                );
                Vec::new()
            }
        };

        if existing.is_empty() {
            return self.create(candidate).await;
        }

        let stale: Vec<&StoredRecord> = existing
            .iter()
            .filter(|r| self.needs_update(r, candidate))
            .collect();

        if stale.is_empty() {
            debug!(subject = %candidate.subject, "Record up to date");
            return ReconcileOutcome::Unchanged;
        }

        let update = RecordUpdate::from(candidate);
        let mut written = 0;
        for record in &stale {
            match self.store.update(&record.id, &update).await {
                Ok(()) => {
                    info!(
                        id = %record.id,
                        company = %candidate.company,
                        from = record.status.as_deref().unwrap_or("-"),
                        to = %candidate.status,
                        "Updated record"
                    );
                    written += 1;
                }
                Err(e) => {
                    error!(id = %record.id, error = %e, "Failed to update record");
                }
            }
        }

        if written > 0 {
            ReconcileOutcome::Updated
        } else {
            ReconcileOutcome::Failed
        }
    }

    fn needs_update(&self, stored: &StoredRecord, candidate: &CandidateRecord) -> bool {
        let status_changed = stored.status.as_deref() != Some(candidate.status.label());
        let link_stale = stored
            .permalink
            .as_deref()
            .is_some_and(|link| is_stale_permalink(link, &self.account_email));
        status_changed || link_stale
    }

    async fn create(&self, candidate: &CandidateRecord) -> ReconcileOutcome {
        match self.store.create(candidate).await {
            Ok(id) => {
                info!(
                    id = %id,
                    company = %candidate.company,
                    title = %candidate.title,
                    status = %candidate.status,
                    "Synced new record"
                );
                ReconcileOutcome::Created
            }
            Err(e) => {
                error!(
                    company = %candidate.company,
                    subject = %candidate.subject,
                    error = %e,
                    "Failed to create record"
                );
                ReconcileOutcome::Failed
            }
        }
    }
}
