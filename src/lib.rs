//! Job Sync: mirrors job-application mail into a Notion tracking database.

pub mod config;
pub mod error;
pub mod mailbox;
pub mod pipeline;
pub mod store;
pub mod sync;
