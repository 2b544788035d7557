//! Account server run loop
//!
//! Connects to NATS, opens the readiness gate and serves claims lookups
//! until cancelled. A failed initial connect ends the run with an error.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::NatsArgs;
use crate::directory::AccountDirectory;
use crate::nats::{ClaimsLookupServer, ConnectionLifecycle, LookupHandler, NatsTransport};
use crate::types::Result;

pub struct AccountServer {
    directory: Arc<AccountDirectory>,
    lifecycle: Arc<ConnectionLifecycle>,
}

impl AccountServer {
    pub fn new(directory: Arc<AccountDirectory>, lifecycle: Arc<ConnectionLifecycle>) -> Self {
        Self {
            directory,
            lifecycle,
        }
    }

    pub fn lifecycle(&self) -> &Arc<ConnectionLifecycle> {
        &self.lifecycle
    }

    /// Run until `cancel` fires or the connection fails
    pub async fn run(&self, args: &NatsArgs, cancel: CancellationToken) -> Result<()> {
        // Liveness flips to unhealthy whenever this function returns
        let _guard = self.lifecycle.begin_run();

        info!(server = %args.nats_url, "Connecting to nats");
        let transport = NatsTransport::connect(
            &args.nats_url,
            &args.nats_creds,
            &args.tls(),
            &args.nats_client_name,
        )
        .await?;

        self.lifecycle.open(Arc::new(transport.clone()));

        let lookup = ClaimsLookupServer::new(LookupHandler::new(Arc::clone(&self.directory)));
        lookup.serve(&transport, cancel).await
    }
}
