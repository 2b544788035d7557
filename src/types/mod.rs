//! Shared types

pub mod error;

pub use error::{AccountServerError, ProbeError, Result};
