//! HTTP route handlers

pub mod health;

pub use health::{health_check, not_found, readiness_check, version_info};
