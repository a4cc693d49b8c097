//! Multipart audio upload handler

use crate::error::ApiError;
use crate::state::{AppState, ServerEvent};
use audioshelf_core::types::non_blank;
use audioshelf_core::LibraryError;
use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    /// Reference of the first stored file
    pub filename: String,
    /// References of every stored file, in upload order
    pub files: Vec<String>,
    pub book_title: String,
}

struct UploadedFile {
    name: String,
    data: Vec<u8>,
}

/// Upload one or more audio files into a book, creating the book on first upload
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut title = None;
    let mut author = None;
    let mut image_url = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" | "files" | "audioFiles" => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                files.push(UploadedFile {
                    name: file_name,
                    data: data.to_vec(),
                });
            }
            "bookTitle" | "author" | "imageUrl" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                match name.as_str() {
                    "bookTitle" => title = Some(value),
                    "author" => author = Some(value),
                    _ => image_url = Some(value),
                }
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("No file uploaded."));
    }
    let title = non_blank(title).ok_or_else(|| ApiError::bad_request("Book title is required."))?;

    let is_new = match state.library.get(&title).await {
        Ok(_) => false,
        Err(LibraryError::NotFound(_)) => true,
        Err(e) => return Err(e.into()),
    };
    let mut stored = Vec::with_capacity(files.len());

    for file in files {
        let upload = state
            .library
            .upload(
                &title,
                author.clone(),
                image_url.clone(),
                &file.name,
                file.data,
            )
            .await?;

        if is_new && stored.is_empty() {
            state.broadcast(ServerEvent::BookCreated {
                title: title.clone(),
            });
        }
        state.broadcast(ServerEvent::FileAdded {
            title: title.clone(),
            file: upload.file_ref.clone(),
        });
        stored.push(upload.file_ref);
    }

    Ok(Json(UploadResponse {
        message: "File uploaded successfully!".to_string(),
        filename: stored[0].clone(),
        files: stored,
        book_title: title,
    }))
}
