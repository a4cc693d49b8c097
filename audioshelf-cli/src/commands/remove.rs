//! Remove-file and delete command implementations

use anyhow::Result;
use audioshelf_core::LibraryStore;

pub async fn remove_file(library: &LibraryStore, title: &str, file_ref: &str) -> Result<()> {
    let book = library.delete_file(title, file_ref).await?;
    println!(
        "Removed '{}' from '{}' ({} file(s) left)",
        file_ref,
        book.title,
        book.files.len()
    );
    Ok(())
}

pub async fn delete(library: &LibraryStore, title: &str) -> Result<()> {
    let book = library.delete_book(title).await?;
    println!("Deleted '{}' and {} file(s)", book.title, book.files.len());
    Ok(())
}
