//! Blob storage backed by OpenDAL

use super::{normalize_key, BlobStore, StorageResult};
use crate::error::StorageError;
use async_trait::async_trait;
use opendal::{Operator, Scheme};
use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;
use std::time::Duration;

/// Blob store over any OpenDAL service (fs, memory, s3, ...)
#[derive(Clone)]
pub struct OpendalBlobStore {
    op: Operator,
}

impl OpendalBlobStore {
    /// Wrap an already configured operator
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    /// Build an operator from a scheme name and its service options
    pub fn from_config(scheme: &str, options: HashMap<String, String>) -> StorageResult<Self> {
        tracing::debug!("Opening {} blob store", scheme);
        let op = Operator::via_map(Scheme::from_str(scheme)?, options)?;
        Ok(Self::new(op))
    }

    /// In-memory blob store (for testing)
    pub fn memory() -> StorageResult<Self> {
        Self::from_config("memory", HashMap::new())
    }
}

#[async_trait]
impl BlobStore for OpendalBlobStore {
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let key = normalize_key(key)?;
        Ok(self.op.read(&key).await?.to_vec())
    }

    async fn read_range(&self, key: &str, range: Range<u64>) -> StorageResult<Vec<u8>> {
        let key = normalize_key(key)?;
        Ok(self.op.read_with(&key).range(range).await?.to_vec())
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        let key = normalize_key(key)?;
        self.op.write(&key, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let key = normalize_key(key)?;
        self.op.delete(&key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let key = normalize_key(key)?;
        Ok(self.op.is_exist(&key).await?)
    }

    async fn size(&self, key: &str) -> StorageResult<u64> {
        let key = normalize_key(key)?;
        Ok(self.op.stat(&key).await?.content_length())
    }

    fn supports_presigned_urls(&self) -> bool {
        self.op.info().full_capability().presign_read
    }

    async fn presigned_read_url(&self, key: &str, expires: Duration) -> StorageResult<String> {
        if !self.supports_presigned_urls() {
            return Err(StorageError::PresignedUrlNotSupported);
        }
        let key = normalize_key(key)?;
        let request = self.op.presign_read(&key, expires).await?;
        Ok(request.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_blob_store() {
        let store = OpendalBlobStore::memory().unwrap();

        store.write("audio/a.mp3", b"hello".to_vec()).await.unwrap();

        let data = store.read("audio/a.mp3").await.unwrap();
        assert_eq!(data, b"hello");

        assert!(store.exists("audio/a.mp3").await.unwrap());
        assert!(!store.exists("audio/missing.mp3").await.unwrap());
        assert_eq!(store.size("audio/a.mp3").await.unwrap(), 5);

        store.delete("audio/a.mp3").await.unwrap();
        assert!(!store.exists("audio/a.mp3").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_range() {
        let store = OpendalBlobStore::memory().unwrap();
        store.write("audio/a.mp3", b"0123456789".to_vec()).await.unwrap();

        assert_eq!(store.read_range("audio/a.mp3", 2..5).await.unwrap(), b"234");
        assert_eq!(store.read_range("audio/a.mp3", 8..10).await.unwrap(), b"89");
    }

    #[tokio::test]
    async fn test_delete_missing_blob_succeeds() {
        let store = OpendalBlobStore::memory().unwrap();
        store.delete("audio/never-written.mp3").await.unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let store = OpendalBlobStore::memory().unwrap();
        let err = store.read("audio/missing.mp3").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_local_blob_store_rejects_traversal() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap().to_string();
        let options = HashMap::from([("root".to_string(), root)]);
        let store = OpendalBlobStore::from_config("fs", options).unwrap();

        store.write("audio/ch1.mp3", b"id3".to_vec()).await.unwrap();
        assert!(dir.path().join("audio").join("ch1.mp3").exists());

        let err = store.write("../escape.mp3", b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
        assert!(!store.supports_presigned_urls());
    }
}
