//! Connection provider: pool creation and per-request connection checkout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;

use crate::error::StoreError;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,

    /// How long a request waits for a connection before giving up, in
    /// milliseconds.
    pub connection_timeout_ms: u64,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
            connection_timeout_ms: 5_000,
        }
    }
}

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out of [`DbPool`]. Returned to the pool on drop.
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Creates a lazily populated SQLite connection pool with foreign key
/// enforcement switched off.
///
/// No connection is opened here. The first checkout opens the file, so an
/// unreachable store shows up as a [`StoreError::Connection`] on the request
/// that needed it.
///
/// # Arguments
///
/// * `db_path` - Path to the SQLite database file. Use `:memory:` for an
///   in-memory database (each pooled connection then sees its own database).
pub fn create_pool(db_path: &Path, settings: DbRuntimeSettings) -> DbPool {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(flags)
        .with_init(move |conn| {
            // Neither pragma reads the file, so a damaged store fails at its
            // first query instead of inside the pool. The journal mode of a
            // store written out-of-band is left as its owner set it.
            // Orphaned song/track references are legal catalog data.
            conn.execute_batch(&format!(
                "PRAGMA foreign_keys = OFF;
                 PRAGMA busy_timeout = {};",
                settings.busy_timeout_ms
            ))
        });

    Pool::builder()
        .max_size(settings.pool_max_size)
        .min_idle(Some(0))
        .connection_timeout(Duration::from_millis(settings.connection_timeout_ms))
        .build_unchecked(manager)
}

/// Handle to the catalog store: its location plus the pool serving it.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct Catalog {
    path: PathBuf,
    pool: DbPool,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("path", &self.path)
            .field("pool_max_size", &self.pool.max_size())
            .finish()
    }
}

impl Catalog {
    /// Builds a catalog handle for the store at `path`.
    pub fn open(path: impl Into<PathBuf>, settings: DbRuntimeSettings) -> Self {
        let path = path.into();
        let pool = create_pool(&path, settings);
        Self { path, pool }
    }

    /// Location of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks out a connection, creating the store's parent directory first
    /// if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Directory` if the parent directory cannot be
    /// created and `StoreError::Connection` if no connection could be
    /// opened within the configured timeout.
    pub fn connection(&self) -> Result<DbConnection, StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Directory {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        Ok(self.pool.get()?)
    }
}
