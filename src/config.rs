//! Configuration for the account resolver
//!
//! All options can be given as CLI flags or environment variables.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// NATS account resolver backed by NatsAccount resources
#[derive(Parser, Debug, Clone)]
#[command(name = "nats-account-resolver")]
#[command(about = "Serves NatsAccount JWTs to a NATS cluster's account resolver")]
#[command(version)]
pub struct Args {
    #[command(flatten)]
    pub nats: NatsArgs,

    #[command(flatten)]
    pub kube: KubeArgs,

    /// Listen address for the health probe server
    #[arg(long, env = "PROBE_LISTEN", default_value = "0.0.0.0:8081")]
    pub probe_listen: SocketAddr,

    /// Seconds between full resyncs of all NatsAccount resources
    ///
    /// Each resync reconciles every resource, and each reconcile publishes a
    /// claims update for its account.
    #[arg(long, env = "RESYNC_INTERVAL_SECS", default_value = "600")]
    pub resync_interval_secs: u64,

    /// Number of concurrent reconcile workers
    #[arg(long, env = "RECONCILE_WORKERS", default_value = "2")]
    pub reconcile_workers: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// NATS connection configuration
#[derive(Parser, Debug, Clone)]
pub struct NatsArgs {
    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// NATS user credentials file (JWT + nkey seed)
    #[arg(long, env = "NATS_CREDS")]
    pub nats_creds: PathBuf,

    /// Client certificate for mutual TLS (requires --nats-client-key)
    #[arg(long, env = "NATS_CLIENT_CERT")]
    pub nats_client_cert: Option<String>,

    /// Client key for mutual TLS (requires --nats-client-cert)
    #[arg(long, env = "NATS_CLIENT_KEY")]
    pub nats_client_key: Option<String>,

    /// Custom root CA for the NATS server certificate
    #[arg(long, env = "NATS_CA")]
    pub nats_ca: Option<String>,

    /// Client name reported to the NATS server
    #[arg(long, env = "NATS_CLIENT_NAME", default_value = "nats-account-resolver")]
    pub nats_client_name: String,
}

/// Kubernetes API configuration
///
/// Defaults to the in-cluster service account when nothing is set.
#[derive(Parser, Debug, Clone)]
pub struct KubeArgs {
    /// Kubernetes API server URL (defaults to the in-cluster service address)
    #[arg(long, env = "KUBE_API_URL")]
    pub kube_api_url: Option<String>,

    /// Bearer token file for the Kubernetes API
    #[arg(long, env = "KUBE_TOKEN_FILE")]
    pub kube_token_file: Option<PathBuf>,

    /// CA bundle for the Kubernetes API server certificate
    #[arg(long, env = "KUBE_CA_FILE")]
    pub kube_ca_file: Option<PathBuf>,

    /// Only watch NatsAccounts in this namespace (all namespaces when unset)
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,
}

/// Optional TLS material for the NATS connection
///
/// Empty paths are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsPaths {
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub ca: Option<PathBuf>,
}

impl TlsPaths {
    pub fn new(client_cert: Option<&str>, client_key: Option<&str>, ca: Option<&str>) -> Self {
        Self {
            client_cert: non_empty(client_cert),
            client_key: non_empty(client_key),
            ca: non_empty(ca),
        }
    }

    /// Client certificate and key, only when both are configured
    pub fn client_pair(&self) -> Option<(&Path, &Path)> {
        match (&self.client_cert, &self.client_key) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }

    /// Custom root CA, if configured
    pub fn root_ca(&self) -> Option<&Path> {
        self.ca.as_deref()
    }

    /// True when exactly one half of the client pair is set
    pub fn is_half_configured(&self) -> bool {
        self.client_cert.is_some() != self.client_key.is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<PathBuf> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

impl NatsArgs {
    /// TLS material with empty values filtered out
    pub fn tls(&self) -> TlsPaths {
        TlsPaths::new(
            self.nats_client_cert.as_deref(),
            self.nats_client_key.as_deref(),
            self.nats_ca.as_deref(),
        )
    }
}

impl Args {
    /// Interval between full resyncs
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.nats.nats_creds.as_os_str().is_empty() {
            return Err("NATS_CREDS is required".to_string());
        }

        if self.nats.tls().is_half_configured() {
            return Err(
                "NATS_CLIENT_CERT and NATS_CLIENT_KEY must be set together".to_string(),
            );
        }

        if self.reconcile_workers == 0 {
            return Err("RECONCILE_WORKERS must be at least 1".to_string());
        }

        if self.resync_interval_secs == 0 {
            return Err("RESYNC_INTERVAL_SECS must be greater than zero".to_string());
        }

        Ok(())
    }
}
