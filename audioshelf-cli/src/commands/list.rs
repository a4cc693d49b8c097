//! List command implementation

use anyhow::Result;
use audioshelf_core::LibraryStore;

/// Print every book with its files in playback order
pub async fn list(library: &LibraryStore, json: bool) -> Result<()> {
    let books = library.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    if books.is_empty() {
        println!("Library is empty");
        return Ok(());
    }

    for book in &books {
        println!("{} by {}", book.title, book.author);
        println!("  Cover: {}", book.image_url);
        for (i, file) in book.files.iter().enumerate() {
            println!("  {:>3}. {}", i + 1, file);
        }
    }

    Ok(())
}
