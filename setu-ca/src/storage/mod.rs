//! Contract document storage
//!
//! Backends are replaceable; the analyzer stores uploads through
//! `DocumentStore` and keeps only the returned reference.

mod local;

pub use local::LocalDocumentStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend failed to read or write
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    /// Reference is malformed or escapes the store
    #[error("Invalid document reference: {0}")]
    InvalidReference(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Opaque reference used for later reads
    pub file_ref: String,
    /// Lowercase hex SHA-256 of the content
    pub sha256: String,
    pub size: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a document and return its reference
    async fn store(&self, filename: &str, content: &[u8]) -> StorageResult<StoredDocument>;

    async fn retrieve(&self, file_ref: &str) -> StorageResult<Vec<u8>>;

    /// Remove a document (used to undo a store when the database write fails)
    async fn remove(&self, file_ref: &str) -> StorageResult<()>;

    fn backend_type(&self) -> &'static str;
}
