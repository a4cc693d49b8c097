//! Persistence of the book collection

use super::StorageResult;
use crate::types::Book;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Loads and saves the whole book collection in storage order
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Load every book. A missing catalog is an empty one.
    async fn load(&self) -> StorageResult<Vec<Book>>;

    /// Replace the stored collection with `books`
    async fn save(&self, books: &[Book]) -> StorageResult<()>;
}

#[derive(Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    books: Vec<Book>,
}

#[derive(Serialize)]
struct CatalogDocumentRef<'a> {
    books: &'a [Book],
}

/// Catalog stored as a single pretty-printed JSON file
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogBackend for JsonFileCatalog {
    async fn load(&self) -> StorageResult<Vec<Book>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<CatalogDocument>(&data) {
            Ok(doc) => Ok(doc.books),
            Err(e) => {
                tracing::warn!(
                    "Catalog at {} is unreadable, treating it as empty: {}",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Writes to a temp file then renames to avoid partial writes
    async fn save(&self, books: &[Book]) -> StorageResult<()> {
        let data = serde_json::to_string_pretty(&CatalogDocumentRef { books })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Same directory keeps the rename on one filesystem
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &data).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

/// In-memory catalog (for testing)
#[derive(Default)]
pub struct MemoryCatalog {
    books: RwLock<Vec<Book>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogBackend for MemoryCatalog {
    async fn load(&self) -> StorageResult<Vec<Book>> {
        Ok(self.books.read().await.clone())
    }

    async fn save(&self, books: &[Book]) -> StorageResult<()> {
        *self.books.write().await = books.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = JsonFileCatalog::new(dir.path().join("library.json"));
        assert!(catalog.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let catalog = JsonFileCatalog::new(&path);
        assert!(catalog.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("library.json");
        let catalog = JsonFileCatalog::new(&path);

        let mut dune = Book::new("Dune", None, None);
        dune.files = vec!["b.mp3".into(), "a.mp3".into()];
        let emma = Book::new("Emma", Some("Jane Austen".into()), None);
        catalog.save(&[emma.clone(), dune.clone()]).await.unwrap();

        let loaded = catalog.load().await.unwrap();
        assert_eq!(loaded, vec![emma, dune]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_reads_books_document_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        tokio::fs::write(
            &path,
            r#"{"books":[{"title":"Dune","author":"Unknown Author","imageUrl":"/default-book-cover.svg","files":["ch1.mp3"]}]}"#,
        )
        .await
        .unwrap();

        let books = JsonFileCatalog::new(&path).load().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].files, vec!["ch1.mp3"]);
    }
}
