//! API handlers for the Stemshelf catalog.
//!
//! Every handler checks out one connection, runs a single read-only query on
//! the blocking pool and maps the outcome onto the JSON error contract:
//! `400` for unusable request bodies, `404` for empty results (and, on the
//! listing endpoints, for store-level failures), `500` for everything else.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stemshelf_db::StoreError;
use thiserror::Error;

use crate::AppState;

/// Service name reported by `GET /`.
pub const SERVICE_NAME: &str = "Stemshelf Audio API";

/// API version reported by `GET /`.
pub const API_VERSION: &str = "2.0";

/// Release date reported by `GET /`. A fixed literal, not the current time.
pub const RELEASE_DATE: &str = "2025-11-11";

/// Response body for `GET /`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Human-readable service name.
    pub message: String,
    /// API version string.
    pub version: String,
    /// Release date of this API version.
    pub timestamp: String,
}

/// Response body for `POST /songs/by-artist`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SongNameResponse {
    /// The randomly chosen song.
    pub song_name: String,
}

/// Response body for `POST /songs/all-by-artist`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SongListResponse {
    /// Song names in insertion order.
    pub songs: Vec<String>,
}

/// Response body for `POST /songs/isolated-tracks`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IsolatedTracksResponse {
    /// Filename of each isolated track, keyed by track type.
    pub tracks: BTreeMap<String, String>,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    /// Maps a store failure on a listing endpoint. Operational failures such
    /// as a missing table are reported as `404`.
    fn from_listing(err: StoreError, context: &str) -> Self {
        if err.is_operational() {
            tracing::warn!(error = %err, "{} query failed at the store", context);
            ApiError::NotFound(format!("database error: {}", err))
        } else {
            tracing::warn!(error = %err, "{} query failed", context);
            ApiError::InternalServerError(format!("server error: {}", err))
        }
    }

    /// Maps a store failure on a lookup endpoint. Every failure is a `500`.
    fn from_lookup(err: StoreError) -> Self {
        tracing::warn!(error = %err, "lookup query failed");
        ApiError::InternalServerError(format!("server error: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::MethodNotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

/// Runs `query` on a pooled connection inside `spawn_blocking`.
///
/// The outer result carries task failures, the inner one store failures, so
/// each handler can choose its own mapping for the latter.
async fn with_connection<T, F>(
    state: Arc<AppState>,
    query: F,
) -> Result<Result<T, StoreError>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = state.catalog.connection()?;
        query(&conn)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))
}

/// Extracts the named string fields from a JSON object body.
///
/// The body is parsed whatever its declared content type. An empty or
/// malformed body, a non-object document, or a missing or non-string field
/// all yield the same `400` naming every required field.
fn required_fields<const N: usize>(
    body: &[u8],
    fields: [&str; N],
) -> Result<[String; N], ApiError> {
    let missing = || {
        let names: Vec<String> = fields.iter().map(|f| format!("'{}'", f)).collect();
        ApiError::BadRequest(format!("missing {} in request", names.join(" and ")))
    };

    let doc: Map<String, Value> = serde_json::from_slice(body).map_err(|_| missing())?;

    let mut values = Vec::with_capacity(N);
    for field in fields {
        match doc.get(field) {
            Some(Value::String(value)) => values.push(value.clone()),
            _ => return Err(missing()),
        }
    }

    values.try_into().map_err(|_| missing())
}

/// Handler for `GET /`.
pub async fn service_info_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: SERVICE_NAME.to_string(),
        version: API_VERSION.to_string(),
        timestamp: RELEASE_DATE.to_string(),
    })
}

/// Fallback for paths with no route.
pub async fn route_not_found_handler() -> ApiError {
    ApiError::NotFound("no such route".to_string())
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed_handler() -> ApiError {
    ApiError::MethodNotAllowed("method not supported on this route".to_string())
}

/// Handler for `GET /artists`.
pub async fn list_artists_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let artists = with_connection(state, stemshelf_db::artist_names)
        .await?
        .map_err(|e| ApiError::from_listing(e, "artist"))?;

    Ok(Json(artists))
}

/// Handler for `GET /songs`.
pub async fn list_songs_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Map<String, Value>>>, ApiError> {
    let songs = with_connection(state, stemshelf_db::songs)
        .await?
        .map_err(|e| match ApiError::from_listing(e, "song") {
            ApiError::NotFound(msg) => {
                ApiError::NotFound(format!("{} (the songs table may not exist)", msg))
            }
            other => other,
        })?;

    Ok(Json(songs))
}

/// Handler for `POST /songs/by-artist`.
pub async fn random_song_by_artist_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SongNameResponse>, ApiError> {
    let [artist_name] = required_fields(&body?, ["artist_name"])?;

    let lookup = artist_name.clone();
    let song = with_connection(state, move |conn| {
        stemshelf_db::random_song_by_artist(conn, &lookup)
    })
    .await?
    .map_err(ApiError::from_lookup)?;

    match song {
        Some(song_name) => Ok(Json(SongNameResponse { song_name })),
        None => {
            tracing::debug!(artist = %artist_name, "no song found for artist");
            Err(ApiError::NotFound(format!(
                "no song found for artist: {}",
                artist_name
            )))
        }
    }
}

/// Handler for `POST /songs/all-by-artist`.
pub async fn songs_by_artist_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SongListResponse>, ApiError> {
    let [artist_name] = required_fields(&body?, ["artist_name"])?;

    let lookup = artist_name.clone();
    let songs = with_connection(state, move |conn| {
        stemshelf_db::songs_by_artist(conn, &lookup)
    })
    .await?
    .map_err(ApiError::from_lookup)?;

    if songs.is_empty() {
        tracing::debug!(artist = %artist_name, "no songs found for artist");
        return Err(ApiError::NotFound(format!(
            "no songs found for artist: {}",
            artist_name
        )));
    }

    Ok(Json(SongListResponse { songs }))
}

/// Handler for `POST /songs/isolated-tracks`.
pub async fn isolated_tracks_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<IsolatedTracksResponse>, ApiError> {
    let [song_name, artist_name] = required_fields(&body?, ["song_name", "artist_name"])?;

    let (song, artist) = (song_name.clone(), artist_name.clone());
    let tracks = with_connection(state, move |conn| {
        stemshelf_db::isolated_tracks(conn, &song, &artist)
    })
    .await?
    .map_err(ApiError::from_lookup)?;

    if tracks.is_empty() {
        tracing::debug!(song = %song_name, artist = %artist_name, "no isolated tracks found");
        return Err(ApiError::NotFound(format!(
            "no tracks found for song '{}' by artist '{}'",
            song_name, artist_name
        )));
    }

    Ok(Json(IsolatedTracksResponse { tracks }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_extracts_strings_in_order() {
        let body = br#"{"artist_name": "Nina", "song_name": "Zephyr", "extra": 1}"#;
        let [song, artist] = required_fields(body, ["song_name", "artist_name"]).unwrap();
        assert_eq!(song, "Zephyr");
        assert_eq!(artist, "Nina");
    }

    #[test]
    fn required_fields_rejects_unusable_bodies() {
        let bodies: [&[u8]; 6] = [
            b"",
            b"not json",
            b"[]",
            b"null",
            br#"{"song_name": "Zephyr"}"#,
            br#"{"song_name": "Zephyr", "artist_name": 7}"#,
        ];

        for body in bodies {
            match required_fields(body, ["song_name", "artist_name"]) {
                Err(ApiError::BadRequest(msg)) => {
                    assert_eq!(msg, "missing 'song_name' and 'artist_name' in request")
                }
                other => panic!("expected bad request for {:?}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn listing_errors_split_on_operational() {
        let conn = Connection::open_in_memory().unwrap();
        let missing_table = stemshelf_db::artist_names(&conn).unwrap_err();
        assert!(matches!(
            ApiError::from_listing(missing_table, "artist"),
            ApiError::NotFound(msg) if msg.starts_with("database error: ")
        ));

        let blob = StoreError::UnrepresentableValue {
            column: "name".to_string(),
            kind: "BLOB",
        };
        assert!(matches!(
            ApiError::from_listing(blob, "song"),
            ApiError::InternalServerError(msg) if msg.starts_with("server error: ")
        ));
    }

    #[test]
    fn lookup_errors_are_internal() {
        let conn = Connection::open_in_memory().unwrap();
        let missing_table = stemshelf_db::songs_by_artist(&conn, "Nina").unwrap_err();
        assert!(matches!(
            ApiError::from_lookup(missing_table),
            ApiError::InternalServerError(_)
        ));
    }
}
