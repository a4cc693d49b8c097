//! Add command implementation

use anyhow::{Context, Result};
use audioshelf_core::LibraryStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Upload audio files into a book, in the order given
pub async fn add(
    library: &LibraryStore,
    title: &str,
    files: &[PathBuf],
    author: Option<String>,
    image_url: Option<String>,
) -> Result<()> {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
            .progress_chars("##-"),
    );

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Could not determine file name of {}", path.display()))?;
        pb.set_message(name.to_string());

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let upload = library
            .upload(title, author.clone(), image_url.clone(), name, data)
            .await
            .with_context(|| format!("Failed to add {} to '{}'", path.display(), title))?;

        tracing::debug!("Stored {} as {}", path.display(), upload.file_ref);
        pb.inc(1);
    }

    pb.finish_and_clear();
    let book = library.get(title).await?;
    println!("Added {} file(s) to '{}'", files.len(), book.title);
    println!("  Files: {}", book.files.len());

    Ok(())
}
