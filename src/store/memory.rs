//! In-process `RecordStore` for fixtures and tests.
//!
//! Counts writes and can be told to fail lookups or writes, so callers can
//! observe exactly how many store mutations a code path performed.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::traits::{RecordStore, RecordUpdate, StoredRecord};
use crate::error::StoreError;
use crate::pipeline::types::CandidateRecord;

/// A record held by `MemoryStore`.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    pub id: String,
    pub subject: String,
    pub title: String,
    pub company: String,
    pub status: Option<String>,
    pub next_action: String,
    pub snippet_lower: String,
    pub permalink: Option<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<MemoryRecord>>,
    creates: AtomicUsize,
    updates: AtomicUsize,
    fail_lookups: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as if an earlier run had created it.
    pub fn seed(&self, subject: &str, status: Option<&str>, permalink: Option<&str>) -> String {
        let mut records = self.records.lock().unwrap();
        let id = format!("page-{}", records.len() + 1);
        records.push(MemoryRecord {
            id: id.clone(),
            subject: subject.to_string(),
            title: subject.to_string(),
            company: String::new(),
            status: status.map(String::from),
            next_action: String::new(),
            snippet_lower: String::new(),
            permalink: permalink.map(String::from),
        });
        id
    }

    /// Snapshot of all records.
    pub fn records(&self) -> Vec<MemoryRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Successful creates so far.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Successful updates so far.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn injected_failure() -> StoreError {
        StoreError::Api {
            status: 503,
            message: "injected failure".into(),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Vec<StoredRecord>, StoreError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Self::injected_failure());
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.subject == subject)
            .map(|r| StoredRecord {
                id: r.id.clone(),
                subject: r.subject.clone(),
                status: r.status.clone(),
                permalink: r.permalink.clone(),
            })
            .collect())
    }

    async fn create(&self, record: &CandidateRecord) -> Result<String, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::injected_failure());
        }
        let mut records = self.records.lock().unwrap();
        let id = format!("page-{}", records.len() + 1);
        records.push(MemoryRecord {
            id: id.clone(),
            subject: record.subject.clone(),
            title: record.title.clone(),
            company: record.company.clone(),
            status: Some(record.status.label().to_string()),
            next_action: record.next_action.clone(),
            snippet_lower: record.snippet_lower.clone(),
            permalink: Some(record.permalink.clone()),
        });
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::injected_failure());
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.into() })?;
        record.status = Some(update.status.clone());
        record.next_action = update.next_action.clone();
        record.snippet_lower = update.snippet_lower.clone();
        record.permalink = Some(update.permalink.clone());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
