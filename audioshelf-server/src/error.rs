//! Mapping library errors onto HTTP responses

use audioshelf_core::LibraryError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Error returned by every handler, rendered as `{ "error": ... }`
#[derive(Debug)]
pub struct ApiError(pub LibraryError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(LibraryError::Validation(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LibraryError::Validation(_) => StatusCode::BAD_REQUEST,
            LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
            LibraryError::Conflict(_) => StatusCode::CONFLICT,
            LibraryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.0);
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}
