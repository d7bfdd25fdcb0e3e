//! Local filesystem document store
//!
//! Each upload is written to `<base>/<uuid>.<ext>`. The reference is the
//! bare file name, so references never contain path separators.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DocumentStore, StorageError, StorageResult, StoredDocument};

/// Longest extension kept from the uploaded file name
const MAX_EXTENSION_LEN: usize = 8;

pub struct LocalDocumentStore {
    base_path: PathBuf,
}

impl LocalDocumentStore {
    /// Create the store, creating its directory if needed
    pub async fn new(base_path: impl AsRef<Path>) -> StorageResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::Backend(format!("Failed to create directory {:?}: {}", base_path, e))
        })?;

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Map a reference to its path, rejecting anything that could escape the store
    fn resolve(&self, file_ref: &str) -> StorageResult<PathBuf> {
        let valid = !file_ref.is_empty()
            && file_ref
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !file_ref.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidReference(file_ref.to_string()));
        }
        Ok(self.base_path.join(file_ref))
    }

    fn generate_ref(filename: &str) -> String {
        let id = Uuid::new_v4();
        match sanitized_extension(filename) {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.to_string(),
        }
    }
}

fn sanitized_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn store(&self, filename: &str, content: &[u8]) -> StorageResult<StoredDocument> {
        let file_ref = Self::generate_ref(filename);
        let path = self.resolve(&file_ref)?;
        let sha256 = format!("{:x}", Sha256::digest(content));

        debug!("Writing document {} ({} bytes)", file_ref, content.len());

        fs::write(&path, content).await.map_err(|e| {
            StorageError::Backend(format!("Failed to write document {}: {}", file_ref, e))
        })?;

        Ok(StoredDocument {
            file_ref,
            sha256,
            size: content.len() as u64,
        })
    }

    async fn retrieve(&self, file_ref: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(file_ref)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(file_ref.to_string()))
            }
            Err(e) => Err(StorageError::Backend(format!(
                "Failed to read document {}: {}",
                file_ref, e
            ))),
        }
    }

    async fn remove(&self, file_ref: &str) -> StorageResult<()> {
        let path = self.resolve(file_ref)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Document {} already absent", file_ref);
                Ok(())
            }
            Err(e) => Err(StorageError::Backend(format!(
                "Failed to remove document {}: {}",
                file_ref, e
            ))),
        }
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_retrieve_remove() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path().join("contracts")).await.unwrap();

        let stored = store.store("Offer Letter.PDF", b"hello contract").await.unwrap();
        assert!(stored.file_ref.ends_with(".pdf"));
        assert_eq!(stored.size, 14);
        assert_eq!(stored.sha256.len(), 64);

        let bytes = store.retrieve(&stored.file_ref).await.unwrap();
        assert_eq!(bytes, b"hello contract");

        store.remove(&stored.file_ref).await.unwrap();
        assert!(matches!(
            store.retrieve(&stored.file_ref).await,
            Err(StorageError::NotFound(_))
        ));
        // Removing twice is not an error
        store.remove(&stored.file_ref).await.unwrap();
    }

    #[tokio::test]
    async fn test_same_name_gets_distinct_refs() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path()).await.unwrap();

        let a = store.store("c.pdf", b"a").await.unwrap();
        let b = store.store("c.pdf", b"a").await.unwrap();
        assert_ne!(a.file_ref, b.file_ref);
        assert_eq!(a.sha256, b.sha256);
    }

    #[tokio::test]
    async fn test_traversal_refs_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path()).await.unwrap();

        for bad in ["../setu.db", "a/b.pdf", "", ".hidden"] {
            assert!(matches!(
                store.retrieve(bad).await,
                Err(StorageError::InvalidReference(_))
            ));
        }
    }

    #[test]
    fn test_extension_sanitizing() {
        assert_eq!(sanitized_extension("x.PDF").as_deref(), Some("pdf"));
        assert_eq!(sanitized_extension("x"), None);
        assert_eq!(sanitized_extension("x.tar.gz").as_deref(), Some("gz"));
        assert_eq!(sanitized_extension("x.p$f"), None);
        assert_eq!(sanitized_extension("x.verylongext"), None);
    }
}
