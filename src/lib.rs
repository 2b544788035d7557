//! NATS account resolver
//!
//! Mirrors NatsAccount resources into an in-memory account directory and
//! serves it to a NATS cluster over the account resolver system subjects.
//!
//! ## Components
//!
//! - **Directory**: public key → account JWT, shared by all components
//! - **Controller**: reconciles NatsAccount resources into the directory
//! - **NATS**: connection lifecycle, claims lookups, claims update notifications
//! - **Server**: the account server run loop and the health probe endpoints

pub mod config;
pub mod controller;
pub mod directory;
pub mod logging;
pub mod nats;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use directory::AccountDirectory;
pub use server::{AccountServer, AppState};
pub use types::{AccountServerError, Result};
