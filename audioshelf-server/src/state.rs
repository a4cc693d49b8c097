//! Application state

use anyhow::{Context, Result};
use audioshelf_core::{LibraryStore, StoreConfig};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The Library Store, opened once at startup
    pub library: Arc<LibraryStore>,

    /// Channel for SSE events
    pub event_tx: broadcast::Sender<ServerEvent>,
}

/// Server-sent events, one per successful library mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerEvent {
    BookCreated {
        title: String,
    },
    FileAdded {
        title: String,
        file: String,
    },
    BookRenamed {
        #[serde(rename = "oldTitle")]
        old_title: String,
        #[serde(rename = "newTitle")]
        new_title: String,
    },
    FileDeleted {
        title: String,
        file: String,
    },
    BookDeleted {
        title: String,
    },
    FilesReordered {
        title: String,
    },
}

impl ServerEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::BookCreated { .. } => "book_created",
            ServerEvent::FileAdded { .. } => "file_added",
            ServerEvent::BookRenamed { .. } => "book_renamed",
            ServerEvent::FileDeleted { .. } => "file_deleted",
            ServerEvent::BookDeleted { .. } => "book_deleted",
            ServerEvent::FilesReordered { .. } => "files_reordered",
        }
    }
}

impl AppState {
    pub fn new(library: LibraryStore) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            library: Arc::new(library),
            event_tx,
        }
    }

    /// Open the Library Store described by `config`
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let library = LibraryStore::open(config)
            .await
            .with_context(|| format!("Failed to open library at {}", config.data_dir.display()))?;
        Ok(Self::new(library))
    }

    /// Subscribe to server events
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast an event
    pub fn broadcast(&self, event: ServerEvent) {
        // Ignore errors (no subscribers)
        let _ = self.event_tx.send(event);
    }
}
