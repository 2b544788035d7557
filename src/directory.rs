//! Account directory
//!
//! Maps an account public key to its signed account JWT. Shared between the
//! reconcile controller (writer) and the claims lookup handler (reader).

use dashmap::DashMap;
use tracing::debug;

/// Thread-safe directory of account credentials, indexed by public key
#[derive(Debug, Default)]
pub struct AccountDirectory {
    accounts: DashMap<String, String>,
}

impl AccountDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the token for an account
    pub fn put(&self, public_key: &str, token: &str) {
        let replaced = self
            .accounts
            .insert(public_key.to_string(), token.to_string())
            .is_some();

        debug!(account = public_key, replaced, "Directory: stored account token");
    }

    /// Get the current token for an account, if known
    ///
    /// Returns an owned copy so a concurrent `put` can never be observed halfway.
    pub fn get(&self, public_key: &str) -> Option<String> {
        self.accounts
            .get(public_key)
            .map(|entry| entry.value().clone())
    }

    /// Remove an account; absent keys are ignored
    pub fn delete(&self, public_key: &str) {
        if self.accounts.remove(public_key).is_some() {
            debug!(account = public_key, "Directory: removed account");
        }
    }

    /// Check whether an account is present
    pub fn contains(&self, public_key: &str) -> bool {
        self.accounts.contains_key(public_key)
    }

    /// Number of accounts currently held
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_put_then_get() {
        let dir = AccountDirectory::new();
        dir.put("ABC123", "tokenXYZ");
        assert_eq!(dir.get("ABC123").as_deref(), Some("tokenXYZ"));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_put_overwrites() {
        let dir = AccountDirectory::new();
        dir.put("ABC123", "old");
        dir.put("ABC123", "new");
        assert_eq!(dir.get("ABC123").as_deref(), Some("new"));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_unknown_key_is_absent() {
        let dir = AccountDirectory::new();
        assert!(dir.get("nobody").is_none());
        assert!(dir.is_empty());
    }

    #[test]
    fn test_delete() {
        let dir = AccountDirectory::new();
        dir.put("ABC123", "tokenXYZ");
        dir.delete("ABC123");
        assert!(dir.get("ABC123").is_none());
        assert!(!dir.contains("ABC123"));

        // Deleting again is a no-op
        dir.delete("ABC123");
        assert!(dir.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_distinct_keys() {
        let dir = Arc::new(AccountDirectory::new());
        let mut handles = Vec::new();

        for task in 0..8 {
            let dir = Arc::clone(&dir);
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    let key = format!("ACC{}-{}", task, i);
                    dir.put(&key, &format!("jwt-{}", key));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(dir.len(), 800);
        for task in 0..8 {
            for i in 0..100 {
                let key = format!("ACC{}-{}", task, i);
                assert_eq!(dir.get(&key), Some(format!("jwt-{}", key)));
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_put_delete_same_key() {
        let dir = Arc::new(AccountDirectory::new());
        let tokens = ["a".repeat(512), "b".repeat(512)];

        let writer = {
            let dir = Arc::clone(&dir);
            let tokens = tokens.clone();
            tokio::spawn(async move {
                for i in 0..500 {
                    dir.put("SHARED", &tokens[i % 2]);
                    if i % 3 == 0 {
                        dir.delete("SHARED");
                    }
                }
            })
        };

        let reader = {
            let dir = Arc::clone(&dir);
            let tokens = tokens.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    if let Some(token) = dir.get("SHARED") {
                        assert!(tokens.contains(&token), "observed torn token");
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();

        // Final state matches the last call made: i = 499 is a put of tokens[1]
        assert_eq!(dir.get("SHARED"), Some(tokens[1].clone()));
    }
}
