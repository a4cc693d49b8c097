//! Audioshelf CLI - manage an audiobook library directly on disk

mod commands;

use anyhow::{Context, Result};
use audioshelf_core::{LibraryStore, StoreConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "audioshelf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Library data directory
    #[arg(long, global = true, env = "AUDIOSHELF_DATA_DIR", default_value = "./audioshelf_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all books and their files
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add audio files to a book, creating it if needed
    Add {
        /// Book title
        title: String,

        /// Audio files to upload, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Book author
        #[arg(short, long)]
        author: Option<String>,

        /// Cover image URL
        #[arg(short, long)]
        image_url: Option<String>,
    },

    /// Rename a book or edit its metadata
    Rename {
        /// Current title
        old_title: String,

        /// New title (repeat the current title to only edit metadata)
        new_title: String,

        /// New author
        #[arg(short, long)]
        author: Option<String>,

        /// New cover image URL
        #[arg(short, long)]
        image_url: Option<String>,
    },

    /// Remove one file from a book
    RemoveFile {
        /// Book title
        title: String,

        /// File reference as shown by `list`
        file_ref: String,
    },

    /// Delete a book and all of its files
    Delete {
        /// Book title
        title: String,
    },

    /// Set the playback order of a book's files
    Reorder {
        /// Book title
        title: String,

        /// Every file reference of the book, in the new order
        #[arg(required = true)]
        files: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "audioshelf_cli=debug,audioshelf_core=debug"
    } else {
        "audioshelf_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = StoreConfig {
        data_dir: cli.data_dir.clone(),
        ..StoreConfig::from_env()
    };
    let library = LibraryStore::open(&config)
        .await
        .with_context(|| format!("Failed to open library at {}", config.data_dir.display()))?;

    match cli.command {
        Commands::List { json } => commands::list(&library, json).await,

        Commands::Add {
            title,
            files,
            author,
            image_url,
        } => commands::add(&library, &title, &files, author, image_url).await,

        Commands::Rename {
            old_title,
            new_title,
            author,
            image_url,
        } => commands::rename(&library, &old_title, new_title, author, image_url).await,

        Commands::RemoveFile { title, file_ref } => {
            commands::remove_file(&library, &title, &file_ref).await
        }

        Commands::Delete { title } => commands::delete(&library, &title).await,

        Commands::Reorder { title, files } => commands::reorder(&library, &title, files).await,
    }
}
