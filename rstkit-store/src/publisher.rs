//! Collision-safe publishing of named blobs.
//!
//! The caller's filename is reduced to its final path component. If an
//! object with that name already exists the publisher derives a fresh one,
//! `<stem>_<8 hex>.<ext>`, and tries again. Existing objects are never
//! replaced.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::{ObjectStore, StoreError};

/// Name used when the caller's filename sanitizes to nothing.
pub const FALLBACK_NAME: &str = "upload";

/// Fresh names tried before giving up.
pub const MAX_ATTEMPTS: usize = 8;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("no free name for {name:?} after {attempts} attempts")]
    NameExhausted { name: String, attempts: usize },
}

/// The key an artifact was actually stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredName(String);

impl StoredName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StoredName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct ArtifactPublisher {
    store: Arc<dyn ObjectStore>,
}

impl fmt::Debug for ArtifactPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactPublisher")
            .field("store", &self.store.describe())
            .finish()
    }
}

impl ArtifactPublisher {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    /// Store `content` under `name`, or a derived name if `name` is taken.
    pub async fn publish(&self, name: &str, content: &[u8]) -> Result<StoredName, PublishError> {
        let base = sanitize_name(name);
        let mut candidate = base.clone();

        for attempt in 1..=MAX_ATTEMPTS {
            if self.store.exists(&candidate).await? {
                debug!(name = %candidate, attempt, "name taken");
            } else {
                match self.store.put(&candidate, content).await {
                    Ok(()) => {
                        info!(
                            requested = %name,
                            stored = %candidate,
                            bytes = content.len(),
                            "artifact published"
                        );
                        return Ok(StoredName(candidate));
                    }
                    // Someone else claimed the name between the check and the put.
                    Err(StoreError::AlreadyExists(_)) => {
                        debug!(name = %candidate, attempt, "name claimed concurrently");
                    }
                    Err(err) => {
                        warn!(name = %candidate, error = %err, "publish failed");
                        return Err(err.into());
                    }
                }
            }
            candidate = suffixed_name(&base);
        }

        warn!(name = %base, attempts = MAX_ATTEMPTS, "no free name found");
        Err(PublishError::NameExhausted {
            name: base,
            attempts: MAX_ATTEMPTS,
        })
    }
}

/// Reduce a caller-supplied filename to a safe, non-empty final component.
pub fn sanitize_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .replace('\0', "");
    match last.as_str() {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        _ => last,
    }
}

/// `report.zip` becomes `report_1a2b3c4d.zip`; names without an extension
/// get the suffix appended.
pub fn suffixed_name(name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    let suffix = &token[..8];
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{suffix}.{ext}"),
        _ => format!("{name}_{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use async_trait::async_trait;

    fn is_suffixed(candidate: &str, stem: &str, ext: &str) -> bool {
        let Some(rest) = candidate.strip_prefix(&format!("{stem}_")) else {
            return false;
        };
        let Some(hex) = rest.strip_suffix(ext) else {
            return false;
        };
        hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("build.zip"), "build.zip");
        assert_eq!(sanitize_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_name("C:\\docs\\out.zip"), "out.zip");
        assert_eq!(sanitize_name("dir/"), FALLBACK_NAME);
        assert_eq!(sanitize_name("  "), FALLBACK_NAME);
        assert_eq!(sanitize_name(".."), FALLBACK_NAME);
    }

    #[test]
    fn test_suffixed_name_shape() {
        assert!(is_suffixed(&suffixed_name("report.zip"), "report", ".zip"));
        assert!(is_suffixed(&suffixed_name("archive.tar.gz"), "archive.tar", ".gz"));
        assert!(is_suffixed(&suffixed_name("README"), "README", ""));
    }

    #[tokio::test]
    async fn test_publish_keeps_free_name() {
        let store = Arc::new(MemoryObjectStore::new());
        let publisher = ArtifactPublisher::new(store.clone());
        let stored = publisher.publish("build.zip", b"zip").await.unwrap();
        assert_eq!(stored.as_str(), "build.zip");
        assert_eq!(store.get("build.zip").unwrap(), b"zip");
    }

    #[tokio::test]
    async fn test_publish_twice_never_overwrites() {
        let store = Arc::new(MemoryObjectStore::new());
        let publisher = ArtifactPublisher::new(store.clone());

        let first = publisher.publish("build.zip", b"one").await.unwrap();
        let second = publisher.publish("build.zip", b"two").await.unwrap();

        assert_ne!(first, second);
        assert!(is_suffixed(second.as_str(), "build", ".zip"));
        assert_eq!(store.get("build.zip").unwrap(), b"one");
        assert_eq!(store.get(second.as_str()).unwrap(), b"two");
    }

    /// Reports every key as taken.
    struct FullStore;

    #[async_trait]
    impl ObjectStore for FullStore {
        async fn exists(&self, _key: &str) -> Result<bool, StoreError> {
            Ok(true)
        }
        async fn put(&self, key: &str, _content: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::AlreadyExists(key.to_string()))
        }
        fn describe(&self) -> String {
            "full".into()
        }
    }

    #[tokio::test]
    async fn test_publish_gives_up_after_max_attempts() {
        let publisher = ArtifactPublisher::new(Arc::new(FullStore));
        let err = publisher.publish("a.zip", b"x").await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::NameExhausted { attempts: MAX_ATTEMPTS, .. }
        ));
    }

    /// Claims a key between the existence check and the put.
    #[derive(Default)]
    struct RacyStore {
        inner: MemoryObjectStore,
    }

    #[async_trait]
    impl ObjectStore for RacyStore {
        async fn exists(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.exists(key).await
        }
        async fn put(&self, key: &str, content: &[u8]) -> Result<(), StoreError> {
            if key == "a.zip" {
                self.inner.put(key, b"theirs").await?;
            }
            self.inner.put(key, content).await
        }
        fn describe(&self) -> String {
            "racy".into()
        }
    }

    #[tokio::test]
    async fn test_publish_retries_when_put_loses_race() {
        let store = Arc::new(RacyStore::default());
        let publisher = ArtifactPublisher::new(store.clone());
        let stored = publisher.publish("a.zip", b"ours").await.unwrap();
        assert!(is_suffixed(stored.as_str(), "a", ".zip"));
        assert_eq!(store.inner.get("a.zip").unwrap(), b"theirs");
        assert_eq!(store.inner.get(stored.as_str()).unwrap(), b"ours");
    }
}
