//! Server components: the NATS account server and the probe HTTP server

pub mod account;
pub mod http;

use std::sync::Arc;

use crate::directory::AccountDirectory;
use crate::nats::ConnectionLifecycle;

pub use account::AccountServer;

/// Shared state for probe handlers
pub struct AppState {
    pub directory: Arc<AccountDirectory>,
    pub lifecycle: Arc<ConnectionLifecycle>,
}
