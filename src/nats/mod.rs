//! NATS messaging layer
//!
//! Connection management plus the account resolver protocol: claims lookups
//! and claims update notifications.

pub mod client;
pub mod lifecycle;
pub mod lookup;
pub mod notify;
pub mod subjects;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{LinkStatus, NatsTransport, Transport};
pub use lifecycle::{ConnectionLifecycle, ConnectionState, RunGuard};
pub use lookup::{ClaimsLookupServer, LookupHandler};
pub use notify::UpdatePublisher;
pub use subjects::{LOOKUP_SUBJECT, UPDATE_SUBJECT};
