//! Audioshelf Core Library
//!
//! This crate provides the Library Store for the Audioshelf audiobook manager:
//! books with ordered audio file lists, persisted through a catalog backend,
//! with the audio bytes kept in a blob backend.

pub mod config;
pub mod error;
pub mod library;
pub mod playback;
pub mod storage;
pub mod types;

pub use config::StoreConfig;
pub use error::{LibraryError, Result, StorageError};
pub use library::{BookEdit, LibraryStore, Upload};
pub use playback::{AudioFile, ByteRange, Playback};
pub use types::{Book, DEFAULT_AUTHOR, DEFAULT_IMAGE_URL};
