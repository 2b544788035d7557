//! Account claims update notifications
//!
//! Publishes an account's new JWT to `$SYS.REQ.CLAIMS.UPDATE` on a detached
//! task. Delivery is at-most-once: failures are logged here and dropped, and
//! nothing backfills notifications missed during an outage.

use bytes::Bytes;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::client::Transport;
use super::subjects::UPDATE_SUBJECT;
use crate::types::AccountServerError;

/// Fire-and-forget publisher for claims updates
#[derive(Debug, Clone, Default)]
pub struct UpdatePublisher;

impl UpdatePublisher {
    pub fn new() -> Self {
        Self
    }

    /// Spawn a publish of `token` for `account`
    ///
    /// The handle is only useful to tests; callers never wait on it.
    pub fn notify(&self, transport: Arc<dyn Transport>, account: &str, token: &str) -> JoinHandle<()> {
        let account = account.to_string();
        let payload = Bytes::from(token.to_string());

        tokio::spawn(async move {
            match transport.publish(UPDATE_SUBJECT.to_string(), payload).await {
                Ok(()) => debug!(account = %account, "Published claims update"),
                Err(e) => report_failure(&account, &e),
            }
        })
    }
}

fn report_failure(account: &str, err: &AccountServerError) {
    warn!(account, "failed to publish claims update: {}", err);
}
