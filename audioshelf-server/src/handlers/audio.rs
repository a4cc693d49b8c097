//! Audio playback handler

use crate::error::ApiError;
use crate::state::AppState;
use audioshelf_core::storage::sanitize_file_name;
use audioshelf_core::{ByteRange, Playback};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioQuery {
    pub file_name: Option<String>,
}

/// Serve a file reference for inline playback, or redirect to where it lives.
///
/// Single `bytes=` ranges are answered with `206 Partial Content` so players
/// can seek; anything else gets the whole file.
pub async fn audio_serve(
    State(state): State<AppState>,
    Query(query): Query<AudioQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let file_ref = query
        .file_name
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("File name is required."))?;

    let file = match state.library.resolve_file(&file_ref).await? {
        Playback::Redirect(url) => return Ok(Redirect::temporary(&url).into_response()),
        Playback::Stream(file) => file,
    };

    let byte_range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(ByteRange::parse);

    let mut response_headers = vec![
        (header::CONTENT_TYPE, file.content_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", sanitize_file_name(&file.file_name)),
        ),
        (header::ACCEPT_RANGES, "bytes".to_string()),
    ];

    let (status, span) = match byte_range {
        None => (StatusCode::OK, 0..file.size),
        Some(range) => match range.resolve(file.size) {
            Some(span) => {
                response_headers.push((
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", span.start, span.end - 1, file.size),
                ));
                (StatusCode::PARTIAL_CONTENT, span)
            }
            None => {
                tracing::debug!("Unsatisfiable range for {} ({} bytes)", file_ref, file.size);
                response_headers.push((header::CONTENT_RANGE, format!("bytes */{}", file.size)));
                return Ok((
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    AppendHeaders(response_headers),
                )
                    .into_response());
            }
        },
    };

    tracing::debug!(
        "Streaming {} bytes {}..{} of {}",
        file_ref,
        span.start,
        span.end,
        file.size
    );
    response_headers.push((header::CONTENT_LENGTH, (span.end - span.start).to_string()));
    let body = Body::from_stream(state.library.stream_file(&file, span));

    Ok((status, AppendHeaders(response_headers), body).into_response())
}
