//! The object store seam: an existence check and a put, keyed by filename.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rstkit_core::{Config, StoreConfig};
use thiserror::Error;

use crate::fs::FsObjectStore;
use crate::http::HttpObjectStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object {0} already exists")]
    AlreadyExists(String),

    #[error("invalid object key {0:?}")]
    InvalidKey(String),

    #[error("invalid store endpoint {0}")]
    InvalidEndpoint(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Key-value blob store keyed by filename.
///
/// `put` must not replace an existing key; implementations that can detect
/// the conflict report it as [`StoreError::AlreadyExists`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn put(&self, key: &str, content: &[u8]) -> Result<(), StoreError>;

    /// Short human-readable description for status output.
    fn describe(&self) -> String;
}

/// Build the store named by the config, if any.
///
/// `token` is the HTTP bearer credential, supplied out of band.
pub fn open_store(
    config: &Config,
    token: Option<String>,
) -> Result<Option<Arc<dyn ObjectStore>>, StoreError> {
    let store: Arc<dyn ObjectStore> = match &config.store {
        StoreConfig::None => return Ok(None),
        StoreConfig::Fs { .. } => {
            let root = config
                .store_root()
                .ok_or_else(|| StoreError::InvalidEndpoint("fs store without root".into()))?;
            Arc::new(FsObjectStore::new(root))
        }
        StoreConfig::Http { endpoint, bucket } => {
            Arc::new(HttpObjectStore::new(endpoint, bucket, token)?)
        }
    };
    tracing::info!(store = %store.describe(), "object store configured");
    Ok(Some(store))
}

/// In-process store, handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock().contains_key(key))
    }

    async fn put(&self, key: &str, content: &[u8]) -> Result<(), StoreError> {
        let mut objects = self.lock();
        if objects.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        objects.insert(key.to_string(), content.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_refuses_overwrite() {
        let store = MemoryObjectStore::new();
        store.put("a.zip", b"one").await.unwrap();
        assert!(store.exists("a.zip").await.unwrap());
        assert!(matches!(
            store.put("a.zip", b"two").await,
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(store.get("a.zip").unwrap(), b"one");
    }

    #[test]
    fn test_open_store_none_by_default() {
        assert!(open_store(&Config::default(), None).unwrap().is_none());
    }
}
