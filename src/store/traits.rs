//! `RecordStore` trait: the structured database the sync mirrors into.
//!
//! Three operations only: query by subject, create, update by id. The
//! store offers no transactions, so a lookup followed by a write is racy.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::pipeline::types::CandidateRecord;

/// A record already persisted in the store, reduced to the fields the
/// reconciler compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Store-native record identifier.
    pub id: String,
    pub subject: String,
    /// Status select name as stored, if set.
    pub status: Option<String>,
    /// Message link as stored, if set.
    pub permalink: Option<String>,
}

/// The mutable subset of a record, rewritten when status or link drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub status: String,
    pub next_action: String,
    pub snippet_lower: String,
    pub permalink: String,
}

impl From<&CandidateRecord> for RecordUpdate {
    fn from(candidate: &CandidateRecord) -> Self {
        Self {
            status: candidate.status.label().to_string(),
            next_action: candidate.next_action.clone(),
            snippet_lower: candidate.snippet_lower.clone(),
            permalink: candidate.permalink.clone(),
        }
    }
}

/// Backend-agnostic record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records whose Subject exactly equals `subject`.
    async fn find_by_subject(&self, subject: &str) -> Result<Vec<StoredRecord>, StoreError>;

    /// Create a record with every field populated. Returns the new record id.
    async fn create(&self, record: &CandidateRecord) -> Result<String, StoreError>;

    /// Overwrite the mutable fields of record `id`.
    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<(), StoreError>;
}
