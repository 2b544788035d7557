//! Error types for the account resolver
//!
//! One top-level error for the service plus narrower errors for the probe
//! and resource layers, which callers match on.

/// Main error type for resolver operations
#[derive(Debug, thiserror::Error)]
pub enum AccountServerError {
    #[error("NATS error: {0}")]
    Nats(String),

    #[error("Kubernetes API error: {0}")]
    Kube(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AccountServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for AccountServerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Kube(err.to_string())
    }
}

impl From<async_nats::ConnectError> for AccountServerError {
    fn from(err: async_nats::ConnectError) -> Self {
        Self::Nats(format!("Failed to connect: {}", err))
    }
}

impl From<async_nats::SubscribeError> for AccountServerError {
    fn from(err: async_nats::SubscribeError) -> Self {
        Self::Nats(format!("Subscribe failed: {}", err))
    }
}

impl From<async_nats::PublishError> for AccountServerError {
    fn from(err: async_nats::PublishError) -> Self {
        Self::Nats(format!("Publish failed: {}", err))
    }
}

/// Health probe failure, rendered into the probe response body
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("Not connected to NATS: run loop has exited")]
    NotLive,

    #[error("NATS client not initialised yet")]
    NotInitialised,

    #[error("NATS is reconnecting")]
    Reconnecting,

    #[error("NATS is not connected")]
    Disconnected,
}

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, AccountServerError>;
