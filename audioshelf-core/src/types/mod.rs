//! Core types for the Audioshelf library

mod book;

pub use book::{non_blank, Book, DEFAULT_AUTHOR, DEFAULT_IMAGE_URL};
