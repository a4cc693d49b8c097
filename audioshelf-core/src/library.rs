//! The Library Store
//!
//! Owns the mapping from title to [`Book`] and keeps each book's ordered file
//! list consistent with the blob backend. Every mutation is a
//! read-modify-write over the whole collection, serialized through a single
//! writer lock so concurrent requests on one store handle never lose updates.
//! Blob deletions run after the catalog is saved and are best-effort: a
//! dangling blob is acceptable, a reference to a deleted blob is not.

use crate::config::StoreConfig;
use crate::error::{LibraryError, Result};
use crate::playback::{audio_content_type, AudioFile, Playback};
use crate::storage::{
    display_name, is_remote_ref, new_blob_key, normalize_key, stream_range, BlobStore, ByteStream,
    CatalogBackend, JsonFileCatalog, OpendalBlobStore,
};
use crate::types::{non_blank, Book};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Lifetime of presigned playback URLs
const PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// Leading bytes inspected to sniff an audio content type
const SNIFF_LEN: u64 = 8192;

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct Upload {
    pub book: Book,
    pub file_ref: String,
}

/// Partial metadata update applied by [`LibraryStore::rename`]
#[derive(Debug, Clone, Default)]
pub struct BookEdit {
    pub new_title: String,
    pub new_author: Option<String>,
    pub new_image_url: Option<String>,
}

pub struct LibraryStore {
    catalog: Arc<dyn CatalogBackend>,
    blobs: Arc<dyn BlobStore>,
    write_lock: Mutex<()>,
}

impl LibraryStore {
    pub fn new(catalog: Arc<dyn CatalogBackend>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            catalog,
            blobs,
            write_lock: Mutex::new(()),
        }
    }

    /// Open the store described by `config`, creating local directories as needed
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .map_err(crate::error::StorageError::from)?;

        let mut options = config.blob_options.clone();
        if config.is_local() && !options.contains_key("root") {
            let uploads = config.uploads_dir();
            tokio::fs::create_dir_all(&uploads)
                .await
                .map_err(crate::error::StorageError::from)?;
            let root = std::path::absolute(&uploads).map_err(crate::error::StorageError::from)?;
            options.insert("root".to_string(), root.to_string_lossy().into_owned());
        }

        let blobs = OpendalBlobStore::from_config(&config.blob_scheme, options)?;
        let catalog = JsonFileCatalog::new(config.catalog_path());
        tracing::info!(
            "Opened library at {} ({} blobs)",
            config.data_dir.display(),
            config.blob_scheme
        );

        Ok(Self::new(Arc::new(catalog), Arc::new(blobs)))
    }

    /// All books in storage order
    pub async fn list(&self) -> Result<Vec<Book>> {
        Ok(self.catalog.load().await?)
    }

    pub async fn get(&self, title: &str) -> Result<Book> {
        self.list()
            .await?
            .into_iter()
            .find(|b| b.title == title)
            .ok_or_else(|| LibraryError::book_not_found(title))
    }

    /// Create an empty book
    pub async fn create(
        &self,
        title: &str,
        author: Option<String>,
        image_url: Option<String>,
    ) -> Result<Book> {
        let title = required_title(title, "title")?;
        let (author, image_url) = (non_blank(author), non_blank(image_url));

        self.mutate(|books| {
            if books.iter().any(|b| b.title == title) {
                return Err(LibraryError::Conflict(format!(
                    "Book '{}' already exists",
                    title
                )));
            }
            let book = Book::new(title, author, image_url);
            books.push(book.clone());
            Ok(book)
        })
        .await
        .inspect(|book| tracing::info!("Created book '{}'", book.title))
    }

    /// Record `file_ref` on the book titled `title`, creating the book if needed.
    ///
    /// The blob behind `file_ref` must already be written.
    pub async fn create_or_append(
        &self,
        title: &str,
        author: Option<String>,
        image_url: Option<String>,
        file_ref: &str,
    ) -> Result<Book> {
        let title = required_title(title, "bookTitle")?;
        if file_ref.trim().is_empty() {
            return Err(LibraryError::Validation("file reference is required".to_string()));
        }
        let (author, image_url) = (non_blank(author), non_blank(image_url));

        self.mutate(|books| {
            if let Some(book) = books.iter_mut().find(|b| b.title == title) {
                if let Some(author) = author {
                    book.author = author;
                }
                if let Some(image_url) = image_url {
                    book.image_url = image_url;
                }
                book.files.push(file_ref.to_string());
                book.touch();
                return Ok(book.clone());
            }

            let mut book = Book::new(title, author, image_url);
            book.files.push(file_ref.to_string());
            books.push(book.clone());
            Ok(book)
        })
        .await
        .inspect(|book| tracing::info!("Added '{}' to book '{}'", file_ref, book.title))
    }

    /// Store `data` as a new blob and append it to the book titled `title`.
    ///
    /// The blob is written before the catalog is touched. If recording the
    /// reference fails the new blob is removed again.
    pub async fn upload(
        &self,
        title: &str,
        author: Option<String>,
        image_url: Option<String>,
        original_name: &str,
        data: Vec<u8>,
    ) -> Result<Upload> {
        required_title(title, "bookTitle")?;

        let file_ref = new_blob_key(original_name);
        tracing::debug!("Writing {} bytes to {}", data.len(), file_ref);
        self.blobs.write(&file_ref, data).await?;

        match self.create_or_append(title, author, image_url, &file_ref).await {
            Ok(book) => Ok(Upload { book, file_ref }),
            Err(e) => {
                self.delete_blob(&file_ref).await;
                Err(e)
            }
        }
    }

    /// Re-key a book and apply a partial metadata update
    pub async fn rename(&self, old_title: &str, edit: BookEdit) -> Result<Book> {
        let old_title = required_title(old_title, "oldTitle")?;
        let new_title = required_title(&edit.new_title, "newTitle")?;
        let new_author = non_blank(edit.new_author);
        let new_image_url = non_blank(edit.new_image_url);

        self.mutate(|books| {
            let index = books
                .iter()
                .position(|b| b.title == old_title)
                .ok_or_else(|| LibraryError::book_not_found(old_title))?;

            if new_title != old_title && books.iter().any(|b| b.title == new_title) {
                return Err(LibraryError::Conflict(format!(
                    "Book '{}' already exists",
                    new_title
                )));
            }

            let book = &mut books[index];
            book.title = new_title.to_string();
            if let Some(author) = new_author {
                book.author = author;
            }
            if let Some(image_url) = new_image_url {
                book.image_url = image_url;
            }
            book.touch();
            Ok(book.clone())
        })
        .await
        .inspect(|_| tracing::info!("Renamed book '{}' to '{}'", old_title, new_title))
    }

    /// Remove one file from a book and delete its blob
    pub async fn delete_file(&self, title: &str, file_ref: &str) -> Result<Book> {
        let title = required_title(title, "bookTitle")?;
        if file_ref.is_empty() {
            return Err(LibraryError::Validation("fileName is required".to_string()));
        }

        let (book, orphaned) = self
            .mutate(|books| {
                let book = books
                    .iter_mut()
                    .find(|b| b.title == title)
                    .ok_or_else(|| LibraryError::book_not_found(title))?;
                let index = book.files.iter().position(|f| f == file_ref).ok_or_else(|| {
                    LibraryError::NotFound(format!(
                        "File '{}' not found in book '{}'",
                        file_ref, title
                    ))
                })?;
                book.files.remove(index);
                book.touch();
                let book = book.clone();

                let orphaned = orphaned_refs(books, vec![file_ref.to_string()]);
                Ok((book, orphaned))
            })
            .await?;

        tracing::info!("Removed '{}' from book '{}'", file_ref, title);
        for file in orphaned {
            self.delete_blob(&file).await;
        }
        Ok(book)
    }

    /// Remove a book and delete every blob it references
    pub async fn delete_book(&self, title: &str) -> Result<Book> {
        let title = required_title(title, "bookTitle")?;

        let (book, orphaned) = self
            .mutate(|books| {
                let index = books
                    .iter()
                    .position(|b| b.title == title)
                    .ok_or_else(|| LibraryError::book_not_found(title))?;
                let book = books.remove(index);
                let orphaned = orphaned_refs(books, book.files.clone());
                Ok((book, orphaned))
            })
            .await?;

        tracing::info!("Deleted book '{}' ({} files)", title, book.files.len());
        for file in orphaned {
            self.delete_blob(&file).await;
        }
        Ok(book)
    }

    /// Replace a book's file order. `new_order` must be a permutation of the current files.
    pub async fn reorder(&self, title: &str, new_order: Vec<String>) -> Result<Book> {
        let title = required_title(title, "bookTitle")?;

        self.mutate(|books| {
            let book = books
                .iter_mut()
                .find(|b| b.title == title)
                .ok_or_else(|| LibraryError::book_not_found(title))?;
            if !book.is_permutation(&new_order) {
                return Err(LibraryError::Validation(
                    "New order contains invalid or missing files".to_string(),
                ));
            }
            book.files = new_order;
            book.touch();
            Ok(book.clone())
        })
        .await
        .inspect(|_| tracing::info!("Reordered files of book '{}'", title))
    }

    /// Decide how to deliver `file_ref` to a player
    pub async fn resolve_file(&self, file_ref: &str) -> Result<Playback> {
        if file_ref.is_empty() {
            return Err(LibraryError::Validation("fileName is required".to_string()));
        }
        if is_remote_ref(file_ref) {
            return Ok(Playback::Redirect(file_ref.to_string()));
        }
        normalize_key(file_ref).map_err(|e| LibraryError::Validation(e.to_string()))?;

        if !self.blobs.exists(file_ref).await? {
            return Err(LibraryError::NotFound(format!("File '{}' not found", file_ref)));
        }

        if self.blobs.supports_presigned_urls() {
            let url = self.blobs.presigned_read_url(file_ref, PRESIGN_EXPIRY).await?;
            return Ok(Playback::Redirect(url));
        }

        let size = self.blobs.size(file_ref).await?;
        let head = match size {
            0 => Vec::new(),
            _ => self.blobs.read_range(file_ref, 0..size.min(SNIFF_LEN)).await?,
        };
        let file_name = display_name(file_ref).to_string();
        Ok(Playback::Stream(AudioFile {
            file_ref: file_ref.to_string(),
            size,
            content_type: audio_content_type(&head, &file_name),
            file_name,
        }))
    }

    /// Stream `span` of a file previously resolved by [`LibraryStore::resolve_file`]
    pub fn stream_file(&self, file: &AudioFile, span: Range<u64>) -> ByteStream {
        stream_range(self.blobs.clone(), file.file_ref.clone(), span)
    }

    /// Run one read-modify-write cycle under the writer lock.
    ///
    /// The collection is only saved when `f` succeeds, so failed operations
    /// leave the stored state untouched.
    async fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Book>) -> Result<T>,
    {
        let _guard = self.write_lock.lock().await;
        let mut books = self.catalog.load().await?;
        let out = f(&mut books)?;
        self.catalog.save(&books).await?;
        Ok(out)
    }

    async fn delete_blob(&self, file_ref: &str) {
        if is_remote_ref(file_ref) {
            tracing::debug!("Skipping delete of remote file {}", file_ref);
            return;
        }
        if let Err(e) = self.blobs.delete(file_ref).await {
            tracing::warn!("Could not delete blob {}: {}", file_ref, e);
        }
    }
}

fn required_title<'a>(title: &'a str, field: &str) -> Result<&'a str> {
    if title.trim().is_empty() {
        Err(LibraryError::Validation(format!("{} is required", field)))
    } else {
        Ok(title)
    }
}

/// Removed references that no remaining book still points at
fn orphaned_refs(books: &[Book], removed: Vec<String>) -> Vec<String> {
    let still_used: HashSet<&str> = books
        .iter()
        .flat_map(|b| b.files.iter().map(String::as_str))
        .collect();
    let mut seen = HashSet::new();
    removed
        .into_iter()
        .filter(|f| !still_used.contains(f.as_str()) && seen.insert(f.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCatalog;
    use crate::types::{DEFAULT_AUTHOR, DEFAULT_IMAGE_URL};
    use futures::StreamExt;

    fn store() -> LibraryStore {
        LibraryStore::new(
            Arc::new(MemoryCatalog::new()),
            Arc::new(OpendalBlobStore::memory().unwrap()),
        )
    }

    fn refs(files: &[&str]) -> Vec<String> {
        files.iter().map(|f| f.to_string()).collect()
    }

    #[tokio::test]
    async fn test_list_empty() {
        assert!(store().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_or_append_new_book_uses_defaults() {
        let store = store();
        let book = store
            .create_or_append("Dune", None, Some("  ".into()), "ch1.mp3")
            .await
            .unwrap();

        assert_eq!(book.files, refs(&["ch1.mp3"]));
        assert_eq!(book.author, DEFAULT_AUTHOR);
        assert_eq!(book.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(store.list().await.unwrap(), vec![book]);
    }

    #[tokio::test]
    async fn test_append_keeps_metadata_unless_supplied() {
        let store = store();
        store
            .create_or_append("Dune", Some("Frank Herbert".into()), None, "ch1.mp3")
            .await
            .unwrap();

        let book = store
            .create_or_append("Dune", Some(String::new()), Some("/dune.jpg".into()), "ch2.mp3")
            .await
            .unwrap();

        assert_eq!(book.files, refs(&["ch1.mp3", "ch2.mp3"]));
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.image_url, "/dune.jpg");
    }

    #[tokio::test]
    async fn test_create_or_append_requires_title() {
        let err = store()
            .create_or_append(" ", None, None, "ch1.mp3")
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_conflicts_with_existing_title() {
        let store = store();
        let book = store.create("Emma", None, None).await.unwrap();
        assert!(book.files.is_empty());

        let err = store.create("Emma", None, None).await.unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_rename_to_same_title_succeeds() {
        let store = store();
        store.create_or_append("Dune", None, None, "ch1.mp3").await.unwrap();

        let book = store
            .rename(
                "Dune",
                BookEdit {
                    new_title: "Dune".into(),
                    new_author: Some("Frank Herbert".into()),
                    new_image_url: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.image_url, DEFAULT_IMAGE_URL);
    }

    #[tokio::test]
    async fn test_rename_conflict_leaves_state_unchanged() {
        let store = store();
        store.create_or_append("Dune", None, None, "ch1.mp3").await.unwrap();
        store.create_or_append("Emma", None, None, "e1.mp3").await.unwrap();
        let before = store.list().await.unwrap();

        let err = store
            .rename(
                "Dune",
                BookEdit {
                    new_title: "Emma".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LibraryError::Conflict(_)));
        assert_eq!(store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_rename_missing_book() {
        let err = store()
            .rename(
                "Nope",
                BookEdit {
                    new_title: "Other".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_keeps_storage_position() {
        let store = store();
        store.create("A", None, None).await.unwrap();
        store.create("B", None, None).await.unwrap();
        store.create("C", None, None).await.unwrap();

        store
            .rename(
                "B",
                BookEdit {
                    new_title: "Z".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let titles: Vec<String> = store.list().await.unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["A", "Z", "C"]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_duplicate_and_keeps_files() {
        let store = store();
        store.create_or_append("Dune", None, None, "ch1.mp3").await.unwrap();
        store.create_or_append("Dune", None, None, "ch2.mp3").await.unwrap();

        let err = store
            .reorder("Dune", refs(&["ch1.mp3", "ch1.mp3"]))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));

        let err = store.reorder("Dune", refs(&["ch2.mp3"])).await.unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));

        assert_eq!(store.get("Dune").await.unwrap().files, refs(&["ch1.mp3", "ch2.mp3"]));
    }

    #[tokio::test]
    async fn test_reorder_missing_book() {
        let err = store().reorder("Nope", Vec::new()).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_last_file_keeps_book() {
        let store = store();
        store.create_or_append("Dune", None, None, "ch1.mp3").await.unwrap();

        let book = store.delete_file("Dune", "ch1.mp3").await.unwrap();
        assert!(book.files.is_empty());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_file_not_in_book() {
        let store = store();
        store.create_or_append("Dune", None, None, "ch1.mp3").await.unwrap();

        let err = store.delete_file("Dune", "ch9.mp3").await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));

        let err = store.delete_file("Emma", "ch1.mp3").await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upload_writes_blob_before_recording() {
        let store = store();
        let upload = store
            .upload("Dune", None, None, "ch1.mp3", b"ID3audio".to_vec())
            .await
            .unwrap();

        assert_eq!(upload.book.files, vec![upload.file_ref.clone()]);
        assert!(store.blobs.exists(&upload.file_ref).await.unwrap());

        store.delete_book("Dune").await.unwrap();
        assert!(!store.blobs.exists(&upload.file_ref).await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_without_title_writes_nothing() {
        let store = store();
        let err = store
            .upload("", None, None, "ch1.mp3", b"data".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shared_blob_survives_until_last_reference() {
        let store = store();
        store.blobs.write("audio/shared.mp3", b"x".to_vec()).await.unwrap();
        store.create_or_append("A", None, None, "audio/shared.mp3").await.unwrap();
        store.create_or_append("B", None, None, "audio/shared.mp3").await.unwrap();

        store.delete_book("A").await.unwrap();
        assert!(store.blobs.exists("audio/shared.mp3").await.unwrap());

        store.delete_file("B", "audio/shared.mp3").await.unwrap();
        assert!(!store.blobs.exists("audio/shared.mp3").await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_file() {
        let store = store();
        let upload = store
            .upload("Dune", None, None, "ch1.ogg", b"OggS-not-really".to_vec())
            .await
            .unwrap();

        let file = match store.resolve_file(&upload.file_ref).await.unwrap() {
            Playback::Stream(file) => file,
            other => panic!("expected a streamed file, got {:?}", other),
        };
        assert_eq!(file.size, 15);
        assert_eq!(file.content_type, "audio/ogg");
        assert_eq!(file.file_name, "ch1.ogg");

        let chunks: Vec<Vec<u8>> = store
            .stream_file(&file, 5..15)
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.concat(), b"not-really");

        assert_eq!(
            store.resolve_file("https://cdn.example.com/a.mp3").await.unwrap(),
            Playback::Redirect("https://cdn.example.com/a.mp3".into())
        );

        let err = store.resolve_file("audio/missing.mp3").await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));

        let err = store.resolve_file("../library.json").await.unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(store());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let title = if i % 2 == 0 { "Even" } else { "Odd" };
                store
                    .create_or_append(title, None, None, &format!("{}.mp3", i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let books = store.list().await.unwrap();
        let total: usize = books.iter().map(|b| b.files.len()).sum();
        assert_eq!(books.len(), 2);
        assert_eq!(total, 16);
    }
}
