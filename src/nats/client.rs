//! NATS client wrapper
//!
//! Builds connection options from the resolver's credentials and TLS
//! settings, and exposes the client through the [`Transport`] seam used by
//! the lookup, notification and probe paths.

use async_nats::connection::State;
use async_nats::{Client, ConnectOptions, Event};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::TlsPaths;
use crate::types::{AccountServerError, Result};

/// Default ping interval for keep-alive
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(120);

/// Live status of the underlying link, as reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    /// Link lost, the client is reconnecting in the background
    Reconnecting,
    Disconnected,
}

/// Subject-level operations the resolver needs from a NATS connection
#[async_trait]
pub trait Transport: Send + Sync {
    /// Current link status; must not block
    fn status(&self) -> LinkStatus;

    /// Publish a payload to a subject
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()>;
}

/// Build connection options
///
/// The credentials file is always used. A client certificate is added only
/// when both cert and key are set; a root CA only when its path is set.
pub async fn build_options(creds_file: &Path, tls: &TlsPaths, name: &str) -> Result<ConnectOptions> {
    let mut options = ConnectOptions::new()
        .name(name)
        .ping_interval(DEFAULT_PING_INTERVAL)
        .event_callback(|event| async move { log_event(event) })
        .credentials_file(creds_file)
        .await
        .map_err(|e| {
            AccountServerError::Config(format!(
                "Failed to load credentials file {}: {}",
                creds_file.display(),
                e
            ))
        })?;

    if let Some((cert, key)) = tls.client_pair() {
        options = options.add_client_certificate(cert.to_path_buf(), key.to_path_buf());
    }

    if let Some(ca) = tls.root_ca() {
        options = options.add_root_certificates(ca.to_path_buf());
    }

    Ok(options)
}

fn log_event(event: Event) {
    match event {
        Event::Connected => info!("NATS connection established"),
        Event::Disconnected => warn!("NATS connection lost, reconnecting"),
        Event::ServerError(e) => error!("NATS server error: {}", e),
        Event::ClientError(e) => error!("NATS client error: {}", e),
        other => warn!("NATS event: {}", other),
    }
}

/// NATS client
#[derive(Clone)]
pub struct NatsTransport {
    client: Client,
}

impl NatsTransport {
    /// Connect to the cluster with a single attempt
    ///
    /// Initial connect failures are returned to the caller. Once connected,
    /// async-nats handles reconnection on its own.
    pub async fn connect(url: &str, creds_file: &Path, tls: &TlsPaths, name: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = build_options(creds_file, tls, name).await?.connect(url).await?;

        info!("Connected to NATS at {}", url);
        Ok(Self { client })
    }

    /// Subscribe to a subject
    pub async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber> {
        Ok(self.client.subscribe(subject.to_string()).await?)
    }
}

#[async_trait]
impl Transport for NatsTransport {
    fn status(&self) -> LinkStatus {
        match self.client.connection_state() {
            State::Connected => LinkStatus::Connected,
            State::Pending => LinkStatus::Reconnecting,
            State::Disconnected => LinkStatus::Disconnected,
        }
    }

    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        Ok(self.client.publish(subject, payload).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials_file_is_config_error() {
        let result = build_options(
            Path::new("/nonexistent/resolver.creds"),
            &TlsPaths::default(),
            "test",
        )
        .await;

        match result {
            Err(AccountServerError::Config(msg)) => assert!(msg.contains("resolver.creds")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected missing credentials to fail"),
        }
    }
}
