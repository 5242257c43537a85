//! Stemshelf server library logic.

pub mod api;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use stemshelf_db::Catalog;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Handle to the catalog store.
    pub catalog: Catalog,
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::service_info_handler))
        .route("/artists", get(api::list_artists_handler))
        .route("/songs", get(api::list_songs_handler))
        .route(
            "/songs/by-artist",
            post(api::random_song_by_artist_handler),
        )
        .route(
            "/songs/all-by-artist",
            post(api::songs_by_artist_handler),
        )
        .route(
            "/songs/isolated-tracks",
            post(api::isolated_tracks_handler),
        )
        .fallback(api::route_not_found_handler)
        .method_not_allowed_fallback(api::method_not_allowed_handler)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
