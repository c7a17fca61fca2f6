//! Shared types for the job-mail pipeline.

use chrono::{DateTime, Utc};

// ── Status ──────────────────────────────────────────────────────────

/// Where an application sits in the hiring pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Applied,
    Rejected,
    /// First interview round.
    Interviewing,
}

impl JobStatus {
    /// Select-option name used in the record store.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Rejected => "Rejected",
            Self::Interviewing => "Interview Round 1",
        }
    }

    /// Inverse of [`JobStatus::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Applied" => Some(Self::Applied),
            "Rejected" => Some(Self::Rejected),
            "Interview Round 1" => Some(Self::Interviewing),
            _ => None,
        }
    }

    /// Suggested follow-up for this status.
    pub fn next_action(&self) -> &'static str {
        match self {
            Self::Applied => "Check status",
            Self::Rejected => "Archived",
            Self::Interviewing => "Schedule/Prepare for interview",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Candidate record ────────────────────────────────────────────────

/// Normalized, not-yet-persisted view of one job-related message.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    /// Display title; the raw subject line.
    pub title: String,
    /// Best-effort company guess, never empty.
    pub company: String,
    /// Original From header.
    pub sender_raw: String,
    /// Original Subject header; the dedup key in the store.
    pub subject: String,
    pub received_at: DateTime<Utc>,
    /// Lowercased preview, at most [`SNIPPET_MAX_CHARS`] characters.
    pub snippet_lower: String,
    /// Link back to the message in the mail web client.
    pub permalink: String,
    pub status: JobStatus,
    pub next_action: String,
    /// When the next action is due.
    pub action_due_at: DateTime<Utc>,
}

/// Preview length limit imposed by the store's rich-text property.
pub const SNIPPET_MAX_CHARS: usize = 2000;

// ── Reconcile outcome ───────────────────────────────────────────────

/// What the reconciler did for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No record existed; a new one was created.
    Created,
    /// An existing record's mutable fields were rewritten.
    Updated,
    /// An existing record already matched; nothing written.
    Unchanged,
    /// The store rejected the write. The next pass will retry.
    Failed,
}

impl ReconcileOutcome {
    /// Whether this outcome counts as a newly created record.
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created)
    }
}
