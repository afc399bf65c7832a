use serde::Serialize;
use thiserror::Error;

use crate::object_store::ObjectStoreError;
use crate::storage::DatabaseError;

/// Failure of an asset or settings operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record or file absent
    #[error("{0}")]
    NotFound(String),
    /// Validation or security failure (empty upload, path traversal, not a file)
    #[error("{0}")]
    Rejected(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),
}

impl StoreError {
    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected(message.into())
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, StoreError::Rejected(_))
    }
}

/// One failed item of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: String,
    pub reason: String,
}
