//! The Book record - a titled, ordered collection of audio file references

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author used when a book is created without one
pub const DEFAULT_AUTHOR: &str = "Unknown Author";

/// Cover image used when a book is created without one
pub const DEFAULT_IMAGE_URL: &str = "/default-book-cover.svg";

/// A book in the library
///
/// `title` is the primary key. `files` holds opaque file references (blob keys
/// or absolute URLs) in playback order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub title: String,

    pub author: String,

    pub image_url: String,

    /// Ordered file references
    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Create an empty book, substituting defaults for absent metadata
    pub fn new(title: impl Into<String>, author: Option<String>, image_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            author: author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            image_url: image_url.unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            files: Vec::new(),
            added_at: now,
            updated_at: now,
        }
    }

    /// Check that `order` is a permutation of the current files.
    ///
    /// Both the length and the multiset must match, so an order that repeats
    /// one file while dropping another is rejected.
    pub fn is_permutation(&self, order: &[String]) -> bool {
        if order.len() != self.files.len() {
            return false;
        }
        let mut current: Vec<&str> = self.files.iter().map(String::as_str).collect();
        let mut proposed: Vec<&str> = order.iter().map(String::as_str).collect();
        current.sort_unstable();
        proposed.sort_unstable();
        current == proposed
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Treat empty or whitespace-only input as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
