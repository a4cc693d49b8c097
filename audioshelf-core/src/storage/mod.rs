//! Storage abstraction layer
//!
//! Two seams sit behind the Library Store: a [`BlobStore`] holding the audio
//! bytes and a [`CatalogBackend`] holding the book records.

mod blob;
mod catalog;

pub use blob::OpendalBlobStore;
pub use catalog::{CatalogBackend, JsonFileCatalog, MemoryCatalog};

use crate::error::StorageError;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Prefix under which uploaded audio blobs are stored
pub const AUDIO_PREFIX: &str = "audio/";

/// Bytes fetched per backend read when streaming a blob
pub const STREAM_CHUNK_SIZE: u64 = 4096 * 16;

/// Blob bytes delivered chunk by chunk
pub type ByteStream = BoxStream<'static, StorageResult<Vec<u8>>>;

/// Abstract blob storage trait
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Read the bytes of `key` within `range`. The end is clamped to the blob size.
    async fn read_range(&self, key: &str, range: Range<u64>) -> StorageResult<Vec<u8>> {
        let data = self.read(key).await?;
        let len = data.len() as u64;
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        Ok(data[start as usize..end as usize].to_vec())
    }

    /// Write `data` under `key`, replacing any existing blob
    async fn write(&self, key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Delete the blob under `key`. Deleting a missing blob succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if a blob exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get the size of a blob in bytes
    async fn size(&self, key: &str) -> StorageResult<u64>;

    /// Whether this backend supports presigned URLs
    fn supports_presigned_urls(&self) -> bool {
        false
    }

    /// Generate a presigned URL for reading (if supported)
    async fn presigned_read_url(&self, _key: &str, _expires: Duration) -> StorageResult<String> {
        Err(StorageError::PresignedUrlNotSupported)
    }
}

/// Stream `range` of the blob under `key` without buffering the whole blob
pub fn stream_range(blobs: Arc<dyn BlobStore>, key: String, range: Range<u64>) -> ByteStream {
    let end = range.end;
    stream::try_unfold(range.start, move |pos| {
        next_chunk(blobs.clone(), key.clone(), pos, end)
    })
    .boxed()
}

async fn next_chunk(
    blobs: Arc<dyn BlobStore>,
    key: String,
    pos: u64,
    end: u64,
) -> StorageResult<Option<(Vec<u8>, u64)>> {
    if pos >= end {
        return Ok(None);
    }
    let chunk = blobs
        .read_range(&key, pos..(pos + STREAM_CHUNK_SIZE).min(end))
        .await?;
    // Blob shrank underneath us
    if chunk.is_empty() {
        return Ok(None);
    }
    let next = pos + chunk.len() as u64;
    Ok(Some((chunk, next)))
}

/// Normalize a blob key, rejecting anything that would escape the store root
pub fn normalize_key(key: &str) -> StorageResult<String> {
    use std::path::Component;

    let mut parts = Vec::new();
    for component in std::path::Path::new(key).components() {
        match component {
            Component::Normal(c) => match c.to_str() {
                Some(s) => parts.push(s),
                None => return Err(StorageError::InvalidKey(key.to_string())),
            },
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                return Err(StorageError::InvalidKey(format!(
                    "path traversal attempt detected in '{}'",
                    key
                )));
            }
        }
    }

    if parts.is_empty() {
        return Err(StorageError::InvalidKey("empty key".to_string()));
    }
    Ok(parts.join("/"))
}

/// Whether a file reference points outside the blob store (an absolute URL)
pub fn is_remote_ref(file_ref: &str) -> bool {
    file_ref.starts_with("http://") || file_ref.starts_with("https://")
}

/// Build a fresh, collision-free blob key for an uploaded file
pub fn new_blob_key(original_name: &str) -> String {
    format!(
        "{}{}-{}",
        AUDIO_PREFIX,
        uuid::Uuid::new_v4().simple(),
        sanitize_file_name(original_name)
    )
}

/// Reduce an uploaded file name to a safe single path segment
pub fn sanitize_file_name(name: &str) -> String {
    // Browsers may send a full client-side path
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .take(120)
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '(' | ')'))
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').replace(' ', "_");
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Display name for a file reference: the original upload name when present
pub fn display_name(file_ref: &str) -> &str {
    let base = file_ref.rsplit('/').next().unwrap_or(file_ref);
    match base.split_once('-') {
        // Keys minted by new_blob_key start with a 32 char simple UUID
        Some((prefix, rest))
            if prefix.len() == 32 && prefix.chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            rest
        }
        _ => base,
    }
}
