//! Error types for job-sync.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the mailbox service.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mailbox access token rejected")]
    AuthFailed,

    #[error("Mailbox API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Message {id} not found")]
    NotFound { id: String },
}

/// Errors from the structured record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from store: {0}")]
    InvalidResponse(String),

    #[error("Record {id} not found")]
    NotFound { id: String },
}

/// Failures turning a raw message into a candidate record.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Message has no identifier")]
    MissingId,

    #[error("Message {id} has no usable account identity for its link")]
    MissingAccount { id: String },
}

/// Result type alias for job-sync.
pub type Result<T> = std::result::Result<T, Error>;
