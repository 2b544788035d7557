//! Periodic resync of NatsAccount resources
//!
//! Lists every watched resource on an interval and enqueues its key, so the
//! directory converges on the API server's state even after missed events
//! or a restart.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::queue::WorkQueue;
use super::resource::AccountResources;

/// Enqueue all resources every `interval` until cancelled
pub async fn run_resync(
    resources: Arc<dyn AccountResources>,
    queue: Arc<WorkQueue>,
    interval: Duration,
    cancel: CancellationToken,
) {
    info!("Resyncing NatsAccounts every {}s", interval.as_secs());

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match resources.list().await {
            Ok(accounts) => {
                debug!(count = accounts.len(), "Listed NatsAccounts");
                for account in accounts {
                    queue.add(account.key()).await;
                }
            }
            Err(e) => warn!("Failed to list NatsAccounts, retrying next resync: {}", e),
        }
    }

    info!("Resync loop stopped");
}
