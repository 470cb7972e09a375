//! # rstkit-store
//!
//! Publishes named blobs to an object store without ever overwriting an
//! existing key.

pub mod fs;
pub mod http;
pub mod publisher;
pub mod store;

pub use fs::FsObjectStore;
pub use http::HttpObjectStore;
pub use publisher::{suffixed_name, ArtifactPublisher, PublishError, StoredName};
pub use store::{open_store, MemoryObjectStore, ObjectStore, StoreError};
