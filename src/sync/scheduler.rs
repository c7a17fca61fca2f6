//! Incremental sync loop.
//!
//! Each pass runs in its own task and the loop awaits it, so two passes never
//! overlap. A failed or panicked pass is logged and the next tick tries again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use super::SyncDriver;

/// Spawn the timer loop running an incremental pass every `interval`.
///
/// The first pass runs one interval after spawning; the caller is expected
/// to have run the backfill pass already. Returns a `JoinHandle` and
/// shutdown flag.
pub fn spawn_sync_loop(
    driver: Arc<SyncDriver>,
    interval: Duration,
    cap: usize,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(
            "Sync loop started, checking every {}s (cap {cap})",
            interval.as_secs()
        );

        let mut tick = tokio::time::interval_at(Instant::now() + interval, interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                info!("Sync loop shutting down");
                return;
            }

            info!("Checking for new job emails");
            let pass = tokio::spawn({
                let driver = Arc::clone(&driver);
                async move { driver.run_pass(cap).await }
            });
            match pass.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!(error = %e, "Sync pass failed"),
                Err(e) => error!(error = %e, "Sync pass aborted"),
            }
        }
    });

    (handle, shutdown_flag)
}
