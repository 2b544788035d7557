//! NatsAccount resources
//!
//! Only the fields the resolver reads are modelled; everything else in the
//! resource is ignored on deserialization.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API group of the NatsAccount custom resource
pub const GROUP: &str = "nats.deinstapel.de";
/// API version of the NatsAccount custom resource
pub const VERSION: &str = "v1alpha1";
/// Plural resource name used in API paths
pub const PLURAL: &str = "natsaccounts";

/// Namespace/name of a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatsAccountStatus {
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub jwt: String,
}

/// A NatsAccount resource snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NatsAccount {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: NatsAccountStatus,
}

impl NatsAccount {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(
            self.metadata.namespace.clone().unwrap_or_default(),
            self.metadata.name.clone(),
        )
    }

    pub fn is_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}

/// List wrapper returned by the API server
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NatsAccountList {
    #[serde(default)]
    pub items: Vec<NatsAccount>,
}

/// Failures reading resources
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Kubernetes API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for ResourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Api(err.to_string())
    }
}

/// Read access to NatsAccount resources
#[async_trait]
pub trait AccountResources: Send + Sync {
    /// Fetch the current snapshot of one resource
    async fn get(&self, key: &ResourceKey) -> Result<NatsAccount, ResourceError>;

    /// List all watched resources
    async fn list(&self) -> Result<Vec<NatsAccount>, ResourceError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory resource store
    #[derive(Default)]
    pub struct MemoryResources {
        items: Mutex<BTreeMap<ResourceKey, NatsAccount>>,
        fail_with: Mutex<Option<String>>,
    }

    impl MemoryResources {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn upsert(&self, account: NatsAccount) {
            self.items.lock().unwrap().insert(account.key(), account);
        }

        pub fn remove(&self, key: &ResourceKey) {
            self.items.lock().unwrap().remove(key);
        }

        /// Make every call fail with an API error until cleared
        pub fn set_failure(&self, message: Option<&str>) {
            *self.fail_with.lock().unwrap() = message.map(str::to_string);
        }

        fn check_failure(&self) -> Result<(), ResourceError> {
            match self.fail_with.lock().unwrap().as_ref() {
                Some(msg) => Err(ResourceError::Api(msg.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl AccountResources for MemoryResources {
        async fn get(&self, key: &ResourceKey) -> Result<NatsAccount, ResourceError> {
            self.check_failure()?;
            self.items
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| ResourceError::NotFound(key.to_string()))
        }

        async fn list(&self) -> Result<Vec<NatsAccount>, ResourceError> {
            self.check_failure()?;
            Ok(self.items.lock().unwrap().values().cloned().collect())
        }
    }

    /// Build an account with the given status fields
    pub fn account(namespace: &str, name: &str, public_key: &str, jwt: &str) -> NatsAccount {
        NatsAccount {
            metadata: ObjectMeta {
                name: name.to_string(),
                namespace: Some(namespace.to_string()),
                deletion_timestamp: None,
            },
            status: NatsAccountStatus {
                public_key: public_key.to_string(),
                jwt: jwt.to_string(),
            },
        }
    }
}
