//! NatsAccount controller
//!
//! Keeps the account directory in line with NatsAccount resources:
//! the watcher enqueues keys, workers reconcile them one key at a time.

pub mod kube;
pub mod queue;
pub mod reconcile;
pub mod resource;
pub mod watcher;

pub use kube::KubeResources;
pub use queue::WorkQueue;
pub use reconcile::{ReconcileController, ReconcileError, ReconcileOutcome};
pub use resource::{AccountResources, NatsAccount, ResourceError, ResourceKey};
pub use watcher::run_resync;
