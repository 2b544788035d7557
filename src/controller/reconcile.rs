//! NatsAccount reconcile controller
//!
//! Projects each resource's latest snapshot into the account directory and
//! announces upserts to the cluster. Only the current snapshot matters;
//! reconciling the same snapshot twice leaves the directory unchanged.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::queue::WorkQueue;
use super::resource::{AccountResources, ResourceError, ResourceKey};
use crate::directory::AccountDirectory;
use crate::nats::{ConnectionLifecycle, UpdatePublisher};

/// What a reconcile did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Resource no longer exists; nothing to do
    Missing,
    /// Resource is being deleted; its entry was removed
    Removed,
    /// Entry stored; `notified` when an update publish was started
    Upserted { notified: bool },
    /// Status not populated yet
    Skipped,
}

/// Retryable reconcile failure
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Failed to fetch {key}: {source}")]
    Fetch {
        key: ResourceKey,
        #[source]
        source: ResourceError,
    },
}

pub struct ReconcileController {
    resources: Arc<dyn AccountResources>,
    directory: Arc<AccountDirectory>,
    lifecycle: Arc<ConnectionLifecycle>,
    publisher: UpdatePublisher,
}

impl ReconcileController {
    pub fn new(
        resources: Arc<dyn AccountResources>,
        directory: Arc<AccountDirectory>,
        lifecycle: Arc<ConnectionLifecycle>,
    ) -> Self {
        Self {
            resources,
            directory,
            lifecycle,
            publisher: UpdatePublisher::new(),
        }
    }

    /// Reconcile one resource
    pub async fn reconcile(&self, key: &ResourceKey) -> Result<ReconcileOutcome, ReconcileError> {
        let account = match self.resources.get(key).await {
            Ok(account) => account,
            Err(ResourceError::NotFound(_)) => {
                debug!(key = %key, "NatsAccount gone, nothing to reconcile");
                return Ok(ReconcileOutcome::Missing);
            }
            Err(source) => {
                return Err(ReconcileError::Fetch {
                    key: key.clone(),
                    source,
                })
            }
        };

        let status = &account.status;

        if account.is_deleted() {
            // Revocation is not handled; the account simply stops resolving
            self.directory.delete(&status.public_key);
            info!(key = %key, account = %status.public_key, "Removed deleted account");
            return Ok(ReconcileOutcome::Removed);
        }

        if status.jwt.is_empty() || status.public_key.is_empty() {
            debug!(key = %key, "NatsAccount status not populated yet");
            return Ok(ReconcileOutcome::Skipped);
        }

        self.directory.put(&status.public_key, &status.jwt);

        let notified = match self.lifecycle.transport() {
            Some(transport) => {
                self.publisher
                    .notify(transport, &account.metadata.name, &status.jwt);
                true
            }
            None => false,
        };

        info!(key = %key, account = %status.public_key, notified, "Reconciled account");
        Ok(ReconcileOutcome::Upserted { notified })
    }

    /// Run `workers` reconcile loops over `queue` until cancelled
    ///
    /// In-flight reconciles finish; keys still queued at cancellation are dropped.
    pub async fn run(self: Arc<Self>, queue: Arc<WorkQueue>, workers: usize, cancel: CancellationToken) {
        info!("Starting {} reconcile workers", workers);

        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let controller = Arc::clone(&self);
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { controller.worker(id, queue).await })
            })
            .collect();

        cancel.cancelled().await;
        queue.shut_down().await;

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Reconcile worker task error: {}", e);
            }
        }
        info!("Reconcile workers stopped");
    }

    async fn worker(&self, id: usize, queue: Arc<WorkQueue>) {
        while let Some(key) = queue.get().await {
            match self.reconcile(&key).await {
                Ok(outcome) => {
                    debug!(worker = id, key = %key, ?outcome, "Reconcile complete");
                    queue.forget(&key).await;
                }
                Err(e) => {
                    warn!(worker = id, "Reconcile failed, requeueing: {}", e);
                    queue.add_rate_limited(key.clone()).await;
                }
            }
            queue.done(&key).await;
        }
    }
}
