//! API routes

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the CORS layer from a comma-separated origin list, or "*" for any
fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let allow_origin = match origins {
        Some("*") => AllowOrigin::any(),
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            AllowOrigin::list(allowed)
        }
        // Default: allow localhost origins for development
        None => AllowOrigin::list([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
        ]),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the application router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/books", get(handlers::list_books).post(handlers::create_book))
        .route(
            "/books/edit",
            get(handlers::get_book_named_like_route).put(handlers::edit_book),
        )
        .route(
            "/books/delete",
            get(handlers::get_book_named_like_route).delete(handlers::delete_book),
        )
        .route(
            "/books/delete-file",
            get(handlers::get_book_named_like_route).delete(handlers::delete_file),
        )
        .route(
            "/books/reorder-files",
            get(handlers::get_book_named_like_route).post(handlers::reorder_files),
        )
        .route("/books/:title", get(handlers::get_book))
        .route("/upload", post(handlers::upload))
        .route("/audio-serve", get(handlers::audio_serve))
        // SSE endpoint
        .route("/sync", get(handlers::sync_events))
        .route("/health", get(handlers::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config.cors_origins.as_deref()))
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .with_state(state)
}
