//! Job-mail processing pipeline.
//!
//! Every message flows through:
//! 1. `parser::parse_message()`: raw headers → `CandidateRecord`
//! 2. `classifier::classify()`: keyword evidence → status + next action
//! 3. `Reconciler::reconcile()`: upsert into the record store

pub mod classifier;
pub mod parser;
pub mod reconciler;
pub mod types;

pub use reconciler::Reconciler;
pub use types::{CandidateRecord, JobStatus, ReconcileOutcome};
