mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Object already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Not a file: {0}")]
    NotAFile(String),
}

/// A stored object discovered by walking the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Slash-separated key relative to the store root
    pub key: String,
    pub size: u64,
}

/// Abstraction over the storage holding uploaded media bytes.
/// Keys are slash-separated relative paths (`2024/07/photo_1720000000000.png`)
/// and must never resolve outside the store root.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Atomically write a new object. Fails with `AlreadyExists` instead of replacing.
    async fn put_new(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;
    /// Every object in the store, sorted by key.
    async fn list(&self) -> Result<Vec<ObjectInfo>, ObjectStoreError>;
}
