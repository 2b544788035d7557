//! Account claims lookup server
//!
//! Answers `$SYS.REQ.ACCOUNT.<id>.CLAIMS.LOOKUP` requests from the account
//! directory. Unknown accounts get an empty reply, which the cluster reads
//! as "no such account".

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::client::{NatsTransport, Transport};
use super::subjects::{account_id_from_subject, LOOKUP_SUBJECT};
use crate::directory::AccountDirectory;
use crate::types::{AccountServerError, Result};

/// Resolves a single lookup request against the directory
#[derive(Clone)]
pub struct LookupHandler {
    directory: Arc<AccountDirectory>,
}

impl LookupHandler {
    pub fn new(directory: Arc<AccountDirectory>) -> Self {
        Self { directory }
    }

    /// Reply payload for a lookup subject
    pub fn resolve(&self, subject: &str) -> Bytes {
        account_id_from_subject(subject)
            .and_then(|id| self.directory.get(id))
            .map(Bytes::from)
            .unwrap_or_default()
    }

    /// Answer a lookup on its reply subject
    ///
    /// Send failures are logged and dropped; the cluster re-requests.
    pub async fn respond(&self, transport: &dyn Transport, subject: &str, reply: Option<&str>) {
        let account_id = account_id_from_subject(subject).unwrap_or_default();
        info!(account = account_id, "account lookup");

        let Some(reply) = reply else {
            warn!(subject, "Lookup request has no reply subject, ignoring");
            return;
        };

        let payload = self.resolve(subject);
        if let Err(e) = transport.publish(reply.to_string(), payload).await {
            warn!(account = account_id, "Failed to respond to NATS with token: {}", e);
        }
    }
}

/// An inbound lookup message
pub trait LookupRequest: Send + 'static {
    fn subject(&self) -> &str;
    fn reply(&self) -> Option<&str>;
}

impl LookupRequest for async_nats::Message {
    fn subject(&self) -> &str {
        self.subject.as_str()
    }

    fn reply(&self) -> Option<&str> {
        self.reply.as_ref().map(|s| s.as_str())
    }
}

/// Subscription owner for the lookup subject
pub struct ClaimsLookupServer {
    handler: LookupHandler,
}

impl ClaimsLookupServer {
    pub fn new(handler: LookupHandler) -> Self {
        Self { handler }
    }

    /// Serve lookups until `cancel` fires, then unsubscribe
    pub async fn serve(&self, transport: &NatsTransport, cancel: CancellationToken) -> Result<()> {
        info!("subscribing to account lookup");
        let mut subscriber = transport.subscribe(LOOKUP_SUBJECT).await?;

        self.dispatch(&mut subscriber, Arc::new(transport.clone()), cancel)
            .await?;

        info!("Unsubscribing from account lookup");
        subscriber
            .unsubscribe()
            .await
            .map_err(|e| AccountServerError::Nats(format!("Unsubscribe failed: {}", e)))
    }

    /// Answer each request from `requests` on its own task until `cancel` fires
    ///
    /// Returns an error if the stream ends before cancellation.
    pub async fn dispatch<S>(
        &self,
        requests: &mut S,
        responder: Arc<dyn Transport>,
        cancel: CancellationToken,
    ) -> Result<()>
    where
        S: Stream + Unpin,
        S::Item: LookupRequest,
    {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                request = requests.next() => {
                    let Some(request) = request else {
                        return Err(AccountServerError::Nats(
                            "Lookup subscription closed unexpectedly".into(),
                        ));
                    };

                    let handler = self.handler.clone();
                    let responder = Arc::clone(&responder);
                    tokio::spawn(async move {
                        handler
                            .respond(responder.as_ref(), request.subject(), request.reply())
                            .await;
                    });
                }
            }
        }
    }
}
