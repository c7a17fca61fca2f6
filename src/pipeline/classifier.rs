//! Keyword status classifier.
//!
//! Rejection evidence always wins over interview evidence: a message that
//! says "the interview process has concluded, unfortunately..." is a rejection.

use tracing::trace;

use crate::pipeline::types::JobStatus;

const REJECTION_KEYWORDS: &[&str] = &[
    "unfortunate",
    "not moving forward",
    "rejected",
    "another candidate",
    "position filled",
    "not be moving",
    "thank you for your interest but",
];

const INTERVIEW_KEYWORDS: &[&str] = &[
    "interview",
    "interviews",
    "meet with",
    "next steps",
    "chat with",
    "scheduling",
    "availability",
];

/// Derive status and suggested next action from subject and snippet.
pub fn classify(subject: &str, snippet: &str) -> (JobStatus, &'static str) {
    let subject = subject.to_lowercase();
    let snippet = snippet.to_lowercase();
    let mentions = |kw: &&str| subject.contains(*kw) || snippet.contains(*kw);

    let status = if let Some(kw) = REJECTION_KEYWORDS.iter().copied().find(mentions) {
        trace!(keyword = kw, "Rejection keyword matched");
        JobStatus::Rejected
    } else if let Some(kw) = INTERVIEW_KEYWORDS.iter().copied().find(mentions) {
        trace!(keyword = kw, "Interview keyword matched");
        JobStatus::Interviewing
    } else {
        JobStatus::Applied
    };

    (status, status.next_action())
}
