//! Best-effort schema initializer.
//!
//! Table definitions are SQL files embedded at compile time. Each one is an
//! idempotent `CREATE TABLE IF NOT EXISTS`, applied at startup in dependency
//! order. A table that cannot be created is logged and skipped; startup never
//! fails because of pre-existing or partial schema state.

use crate::error::StoreError;
use crate::pool::Catalog;

/// A single embedded table definition.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    /// Name of the table the statement creates.
    pub name: &'static str,
    /// The `CREATE TABLE IF NOT EXISTS` statement.
    pub sql: &'static str,
}

/// All catalog tables, in the order they are created.
pub const TABLES: &[TableSchema] = &[
    TableSchema {
        name: "artist",
        sql: include_str!("schema/000_artist.sql"),
    },
    TableSchema {
        name: "songs",
        sql: include_str!("schema/001_songs.sql"),
    },
    TableSchema {
        name: "isolated_tracks",
        sql: include_str!("schema/002_isolated_tracks.sql"),
    },
];

/// Creates a single table if it does not exist yet.
///
/// # Errors
///
/// Returns `StoreError` if no connection can be obtained or the statement
/// fails.
pub fn ensure_table(catalog: &Catalog, table: &TableSchema) -> Result<(), StoreError> {
    let conn = catalog.connection()?;
    conn.execute_batch(table.sql)?;
    Ok(())
}

/// Ensures every catalog table exists.
///
/// Failures are logged per table and otherwise ignored.
pub fn ensure_schema(catalog: &Catalog) {
    for table in TABLES {
        match ensure_table(catalog, table) {
            Ok(()) => tracing::debug!(table = table.name, "table ensured"),
            Err(e) => tracing::warn!(
                table = table.name,
                path = %catalog.path().display(),
                "failed to ensure table, continuing startup: {}",
                e
            ),
        }
    }
}
