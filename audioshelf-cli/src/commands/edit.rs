//! Rename and reorder command implementations

use anyhow::Result;
use audioshelf_core::{BookEdit, LibraryStore};

/// Rename a book and apply any supplied metadata
pub async fn rename(
    library: &LibraryStore,
    old_title: &str,
    new_title: String,
    author: Option<String>,
    image_url: Option<String>,
) -> Result<()> {
    let book = library
        .rename(
            old_title,
            BookEdit {
                new_title,
                new_author: author,
                new_image_url: image_url,
            },
        )
        .await?;

    println!("Updated '{}' -> '{}'", old_title, book.title);
    println!("  Author: {}", book.author);
    println!("  Cover:  {}", book.image_url);
    Ok(())
}

/// Commit a new playback order
pub async fn reorder(library: &LibraryStore, title: &str, files: Vec<String>) -> Result<()> {
    let book = library.reorder(title, files).await?;

    println!("Reordered '{}'", book.title);
    for (i, file) in book.files.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, file);
    }
    Ok(())
}
