//! Storage layer for the Stemshelf catalog service.
//!
//! Provides the SQLite connection provider (pooled via `r2d2`), the
//! best-effort schema initializer run at startup, and the read-only catalog
//! queries behind every HTTP endpoint. Rows are written out-of-band; nothing
//! in this crate mutates catalog data.
//!
//! # Design decisions
//!
//! - **Lazy pool**: the pool never opens a connection at construction, so a
//!   missing or unreadable store surfaces as a per-request error rather than
//!   a startup failure.
//! - **No foreign key enforcement**: songs and isolated tracks may reference
//!   rows that do not exist. Queries use inner joins, so orphans are simply
//!   invisible to them.
//! - **Embedded DDL**: table definitions are compiled into the binary via
//!   `include_str!`.

mod catalog;
mod error;
mod pool;
mod schema;

pub use catalog::{artist_names, isolated_tracks, random_song_by_artist, songs, songs_by_artist};
pub use error::StoreError;
pub use pool::{create_pool, Catalog, DbConnection, DbPool, DbRuntimeSettings};
pub use schema::{ensure_schema, ensure_table, TableSchema, TABLES};
