//! Kubernetes API source for NatsAccount resources
//!
//! Talks to the API server over REST. Without explicit configuration it
//! uses the pod's service account: the API address from
//! `KUBERNETES_SERVICE_HOST`/`KUBERNETES_SERVICE_PORT`, and the token and CA
//! mounted under `/var/run/secrets/kubernetes.io/serviceaccount`.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::resource::{
    AccountResources, NatsAccount, NatsAccountList, ResourceError, ResourceKey, GROUP, PLURAL,
    VERSION,
};
use crate::config::KubeArgs;
use crate::types::{AccountServerError, Result};

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// NatsAccount reader backed by the Kubernetes API server
pub struct KubeResources {
    http: reqwest::Client,
    base_url: String,
    token_file: Option<PathBuf>,
    namespace: Option<String>,
}

impl KubeResources {
    /// Build a client from configuration, falling back to in-cluster defaults
    pub fn from_args(args: &KubeArgs) -> Result<Self> {
        let base_url = match &args.kube_api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => in_cluster_url()?,
        };

        let ca_file = args
            .kube_ca_file
            .clone()
            .or_else(|| existing(Path::new(SERVICE_ACCOUNT_DIR).join("ca.crt")));
        let token_file = args
            .kube_token_file
            .clone()
            .or_else(|| existing(Path::new(SERVICE_ACCOUNT_DIR).join("token")));

        let mut builder = reqwest::Client::builder();
        if let Some(ca_file) = &ca_file {
            let pem = std::fs::read(ca_file).map_err(|e| {
                AccountServerError::Config(format!(
                    "Failed to read Kubernetes CA {}: {}",
                    ca_file.display(),
                    e
                ))
            })?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        info!(
            api = %base_url,
            namespace = args.watch_namespace.as_deref().unwrap_or("*"),
            "Using Kubernetes API for NatsAccount resources"
        );

        Ok(Self {
            http: builder.build()?,
            base_url,
            token_file,
            namespace: args.watch_namespace.clone().filter(|ns| !ns.is_empty()),
        })
    }

    fn resource_url(&self, key: &ResourceKey) -> String {
        format!(
            "{}/apis/{}/{}/namespaces/{}/{}/{}",
            self.base_url, GROUP, VERSION, key.namespace, PLURAL, key.name
        )
    }

    fn collection_url(&self) -> String {
        match &self.namespace {
            Some(ns) => format!(
                "{}/apis/{}/{}/namespaces/{}/{}",
                self.base_url, GROUP, VERSION, ns, PLURAL
            ),
            None => format!("{}/apis/{}/{}/{}", self.base_url, GROUP, VERSION, PLURAL),
        }
    }

    /// GET a URL with the current bearer token
    ///
    /// The token file is re-read per request since projected tokens rotate.
    async fn send(&self, url: &str) -> std::result::Result<reqwest::Response, ResourceError> {
        let mut request = self.http.get(url);
        if let Some(token_file) = &self.token_file {
            let token = tokio::fs::read_to_string(token_file).await.map_err(|e| {
                ResourceError::Api(format!("Failed to read token {}: {}", token_file.display(), e))
            })?;
            request = request.bearer_auth(token.trim());
        }

        debug!(url, "Kubernetes API request");
        Ok(request.send().await?)
    }
}

#[async_trait]
impl AccountResources for KubeResources {
    async fn get(&self, key: &ResourceKey) -> std::result::Result<NatsAccount, ResourceError> {
        let response = self.send(&self.resource_url(key)).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ResourceError::NotFound(key.to_string())),
            status if status.is_success() => Ok(response.json::<NatsAccount>().await?),
            status => Err(ResourceError::Api(format!("GET {} returned {}", key, status))),
        }
    }

    async fn list(&self) -> std::result::Result<Vec<NatsAccount>, ResourceError> {
        let response = self.send(&self.collection_url()).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResourceError::Api(format!("LIST {} returned {}", PLURAL, status)));
        }
        Ok(response.json::<NatsAccountList>().await?.items)
    }
}

fn in_cluster_url() -> Result<String> {
    let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
        AccountServerError::Config(
            "KUBE_API_URL is not set and KUBERNETES_SERVICE_HOST is unavailable".to_string(),
        )
    })?;
    let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

    // IPv6 service addresses need brackets
    if host.contains(':') {
        Ok(format!("https://[{}]:{}", host, port))
    } else {
        Ok(format!("https://{}:{}", host, port))
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources(namespace: Option<&str>) -> KubeResources {
        KubeResources::from_args(&KubeArgs {
            kube_api_url: Some("http://127.0.0.1:8001/".to_string()),
            kube_token_file: None,
            kube_ca_file: None,
            watch_namespace: namespace.map(str::to_string),
        })
        .unwrap()
    }

    #[test]
    fn test_resource_url() {
        let kube = resources(None);
        assert_eq!(
            kube.resource_url(&ResourceKey::new("nats", "alpha")),
            "http://127.0.0.1:8001/apis/nats.deinstapel.de/v1alpha1/namespaces/nats/natsaccounts/alpha"
        );
    }

    #[test]
    fn test_collection_url_scoping() {
        assert_eq!(
            resources(None).collection_url(),
            "http://127.0.0.1:8001/apis/nats.deinstapel.de/v1alpha1/natsaccounts"
        );
        assert_eq!(
            resources(Some("nats")).collection_url(),
            "http://127.0.0.1:8001/apis/nats.deinstapel.de/v1alpha1/namespaces/nats/natsaccounts"
        );
        // An empty namespace means cluster-wide
        assert_eq!(
            resources(Some("")).collection_url(),
            resources(None).collection_url()
        );
    }
}
