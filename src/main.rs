use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tracing::{error, info};

use job_sync::config::{DEFAULT_FATAL_EXIT_DELAY_SECS, SyncConfig};
use job_sync::error::Result;
use job_sync::mailbox::{GmailClient, Mailbox};
use job_sync::store::{NotionStore, RecordStore};
use job_sync::sync::{SyncDriver, spawn_sync_loop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => match fatal(Duration::from_secs(DEFAULT_FATAL_EXIT_DELAY_SECS), &e).await {},
    };

    eprintln!("📬 Job Sync v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Notion database: {}", config.database_id);
    eprintln!("   Interval: {}s", config.poll_interval.as_secs());
    eprintln!(
        "   Caps: backfill {}, incremental {}\n",
        config.backfill_cap, config.incremental_cap
    );

    let mailbox: Arc<dyn Mailbox> = Arc::new(GmailClient::new(
        config.gmail_api_base.clone(),
        config.gmail_access_token.clone(),
    ));

    let account_email = match resolve_account(&config, mailbox.as_ref()).await {
        Ok(email) => email,
        Err(e) => match fatal(config.fatal_exit_delay, &e).await {},
    };
    info!(account = %account_email, "Authenticated mailbox");

    let store: Arc<dyn RecordStore> = Arc::new(NotionStore::new(
        config.notion_api_base.clone(),
        config.notion_token.clone(),
        config.database_id.clone(),
    ));

    let driver = Arc::new(SyncDriver::new(
        mailbox,
        store,
        account_email,
        config.record_delay,
    ));

    // ── Backfill ─────────────────────────────────────────────────────────
    info!(cap = config.backfill_cap, "Starting backfill");
    match driver.run_pass(config.backfill_cap).await {
        Ok(report) => info!(
            created = report.created,
            updated = report.updated,
            "Backfill complete"
        ),
        Err(e) => error!(error = %e, "Backfill failed, continuing with incremental sync"),
    }

    // ── Incremental loop ─────────────────────────────────────────────────
    let (handle, shutdown) =
        spawn_sync_loop(driver, config.poll_interval, config.incremental_cap);

    info!("Job sync running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping...");

    shutdown.store(true, Ordering::Relaxed);
    handle.abort();

    info!("Job sync stopped");
    Ok(())
}

/// Account identity from config, falling back to the mailbox profile.
async fn resolve_account(config: &SyncConfig, mailbox: &dyn Mailbox) -> Result<String> {
    if let Some(email) = &config.account_email {
        return Ok(email.clone());
    }
    Ok(mailbox.account_email().await?)
}

/// Log, wait, exit non-zero. Never returns.
async fn fatal(delay: Duration, err: &dyn std::fmt::Display) -> Infallible {
    error!("Fatal: {err}");
    eprintln!("Error: {err}");
    tokio::time::sleep(delay).await;
    std::process::exit(1);
}
