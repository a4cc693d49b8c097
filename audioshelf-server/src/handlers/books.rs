//! Book management handlers

use crate::error::ApiError;
use crate::state::{AppState, ServerEvent};
use audioshelf_core::{Book, BookEdit};
use axum::{
    extract::{rejection::JsonRejection, MatchedPath, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

/// Confirmation returned by mutating endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// List all books in storage order
pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    Ok(Json(state.library.list().await?))
}

/// Get a single book by title
pub async fn get_book(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<Book>, ApiError> {
    Ok(Json(state.library.get(&title).await?))
}

/// `GET` on a fixed `/books/<action>` route: a book may be titled like the action
pub async fn get_book_named_like_route(
    State(state): State<AppState>,
    path: MatchedPath,
) -> Result<Json<Book>, ApiError> {
    let title = path.as_str().rsplit('/').next().unwrap_or_default();
    Ok(Json(state.library.get(title).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: String,
    pub author: Option<String>,
    pub image_url: Option<String>,
}

/// Create an empty book
pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let Json(req) = payload?;
    let book = state
        .library
        .create(&req.title, req.author, req.image_url)
        .await?;

    state.broadcast(ServerEvent::BookCreated {
        title: book.title.clone(),
    });
    Ok((StatusCode::CREATED, Json(book)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBookRequest {
    #[serde(default)]
    pub old_title: String,
    #[serde(default)]
    pub new_title: String,
    pub new_author: Option<String>,
    pub new_image_url: Option<String>,
}

/// Rename a book and edit its metadata
pub async fn edit_book(
    State(state): State<AppState>,
    payload: Result<Json<EditBookRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let book = state
        .library
        .rename(
            &req.old_title,
            BookEdit {
                new_title: req.new_title,
                new_author: req.new_author,
                new_image_url: req.new_image_url,
            },
        )
        .await?;

    state.broadcast(ServerEvent::BookRenamed {
        old_title: req.old_title.clone(),
        new_title: book.title.clone(),
    });
    Ok(MessageResponse::new(format!(
        "Book title updated from '{}' to '{}'.",
        req.old_title, book.title
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBookRequest {
    #[serde(default)]
    pub book_title: String,
}

/// Delete a book and all of its files
pub async fn delete_book(
    State(state): State<AppState>,
    payload: Result<Json<DeleteBookRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let book = state.library.delete_book(&req.book_title).await?;

    state.broadcast(ServerEvent::BookDeleted {
        title: book.title.clone(),
    });
    Ok(MessageResponse::new(format!(
        "Book '{}' and its files deleted successfully.",
        book.title
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileRequest {
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub file_name: String,
}

/// Remove one file from a book
pub async fn delete_file(
    State(state): State<AppState>,
    payload: Result<Json<DeleteFileRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    state
        .library
        .delete_file(&req.book_title, &req.file_name)
        .await?;

    let message = format!(
        "Audio file '{}' deleted successfully from '{}'.",
        req.file_name, req.book_title
    );
    state.broadcast(ServerEvent::FileDeleted {
        title: req.book_title,
        file: req.file_name,
    });
    Ok(MessageResponse::new(message))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFilesRequest {
    #[serde(default)]
    pub book_title: String,
    pub new_order: Option<Vec<String>>,
}

/// Commit a new file order for a book
pub async fn reorder_files(
    State(state): State<AppState>,
    payload: Result<Json<ReorderFilesRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let new_order = req
        .new_order
        .ok_or_else(|| ApiError::bad_request("newOrder is required"))?;
    let book = state.library.reorder(&req.book_title, new_order).await?;

    state.broadcast(ServerEvent::FilesReordered {
        title: book.title.clone(),
    });
    Ok(MessageResponse::new(format!(
        "Audio files for '{}' reordered successfully.",
        book.title
    )))
}
