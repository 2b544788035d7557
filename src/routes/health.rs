//! Health check endpoints
//!
//! Kubernetes-style probes:
//! - /health, /healthz - Liveness probe (is the NATS run loop still running?)
//! - /ready, /readyz - Readiness probe (is the NATS connection usable now?)
//!
//! Transient reconnects only affect readiness. The directory is kept in
//! memory across them.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::nats::ConnectionState;
use crate::server::AppState;
use crate::types::ProbeError;

/// Probe response body
#[derive(Serialize)]
pub struct ProbeResponse {
    /// "ok" or "unhealthy"
    pub status: &'static str,
    /// Connection state machine position
    pub connection: ConnectionState,
    /// Accounts currently served
    pub accounts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn probe_response(state: &AppState, result: Result<(), ProbeError>) -> Response<Full<Bytes>> {
    let (status, error) = match result {
        Ok(()) => (StatusCode::OK, None),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, Some(e.to_string())),
    };

    let body = ProbeResponse {
        status: if error.is_none() { "ok" } else { "unhealthy" },
        connection: state.lifecycle.state(),
        accounts: state.directory.len(),
        error,
    };

    json_response(status, &body)
}

/// Handle liveness probe (/health, /healthz)
pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    probe_response(state, state.lifecycle.liveness_check())
}

/// Handle readiness probe (/ready, /readyz)
pub fn readiness_check(state: &AppState) -> Response<Full<Bytes>> {
    probe_response(state, state.lifecycle.readiness_check())
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            service: env!("CARGO_PKG_NAME"),
        },
    )
}

/// 404 for unknown paths
pub fn not_found(path: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(format!("Not found: {}", path))));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(body)
        .unwrap_or_else(|_| r#"{"status":"unhealthy","error":"Serialization failed"}"#.to_string());

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
