//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com";
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com";
pub const DEFAULT_FATAL_EXIT_DELAY_SECS: u64 = 10;

/// Sync configuration, read once at startup and passed to each component.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Notion integration token.
    pub notion_token: SecretString,
    /// Target Notion database (collection) identifier.
    pub database_id: String,
    /// Gmail OAuth access token. Acquiring and refreshing it happens elsewhere.
    pub gmail_access_token: SecretString,
    /// Account identity for permalinks. Resolved from the profile endpoint when unset.
    pub account_email: Option<String>,
    /// Time between incremental passes.
    pub poll_interval: Duration,
    /// Message cap for the startup backfill pass.
    pub backfill_cap: usize,
    /// Message cap for each incremental pass.
    pub incremental_cap: usize,
    /// Pause after each reconciled record.
    pub record_delay: Duration,
    /// Pause before exiting on a fatal startup error.
    pub fatal_exit_delay: Duration,
    pub gmail_api_base: String,
    pub notion_api_base: String,
}

impl SyncConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let notion_token = SecretString::from(required("NOTION_TOKEN")?);
        let database_id = required("DATABASE_ID")?;
        let gmail_access_token = SecretString::from(required("GMAIL_ACCESS_TOKEN")?);

        let account_email = lookup("GMAIL_ACCOUNT_EMAIL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let poll_interval = Duration::from_secs(parse_or(&lookup, "JOB_SYNC_INTERVAL_SECS", 120)?);
        let backfill_cap = parse_or(&lookup, "JOB_SYNC_BACKFILL_CAP", 500)?;
        let incremental_cap = parse_or(&lookup, "JOB_SYNC_INCREMENTAL_CAP", 50)?;
        let record_delay =
            Duration::from_millis(parse_or(&lookup, "JOB_SYNC_RECORD_DELAY_MS", 500)?);
        let fatal_exit_delay = Duration::from_secs(parse_or(
            &lookup,
            "JOB_SYNC_FATAL_EXIT_DELAY_SECS",
            DEFAULT_FATAL_EXIT_DELAY_SECS,
        )?);

        if poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "JOB_SYNC_INTERVAL_SECS".into(),
                message: "must be greater than zero".into(),
            });
        }

        let gmail_api_base = lookup("GMAIL_API_BASE")
            .unwrap_or_else(|| DEFAULT_GMAIL_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let notion_api_base = lookup("NOTION_API_BASE")
            .unwrap_or_else(|| DEFAULT_NOTION_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            notion_token,
            database_id,
            gmail_access_token,
            account_email,
            poll_interval,
            backfill_cap,
            incremental_cap,
            record_delay,
            fatal_exit_delay,
            gmail_api_base,
            notion_api_base,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{raw:?}: {e}"),
                })
        }
        _ => Ok(default),
    }
}
