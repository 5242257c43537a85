//! Error types for the storage layer.

use rusqlite::ErrorCode;
use std::path::PathBuf;

/// Errors that can occur while reaching or querying the catalog store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The parent directory of the store file could not be created.
    #[error("failed to create store directory {}: {source}", path.display())]
    Directory {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A connection could not be opened or checked out of the pool.
    #[error("store connection failed: {0}")]
    Connection(#[from] r2d2::Error),

    /// A statement failed to prepare or execute.
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored value has no JSON rendition.
    #[error("column '{column}' holds a {kind} value that cannot be rendered as JSON")]
    UnrepresentableValue {
        /// The column holding the value.
        column: String,
        /// A short description of the stored value.
        kind: &'static str,
    },
}

impl StoreError {
    /// Returns `true` for failures reported by the storage engine itself, as
    /// opposed to a query that succeeded with unusable data.
    ///
    /// Missing tables and columns fall in this class (SQLite reports them
    /// with the generic `SQLITE_ERROR` code), as do locking, I/O and
    /// open failures.
    pub fn is_operational(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Sqlite(err) => matches!(
                err.sqlite_error_code(),
                Some(
                    ErrorCode::Unknown
                        | ErrorCode::DatabaseBusy
                        | ErrorCode::DatabaseLocked
                        | ErrorCode::CannotOpen
                        | ErrorCode::SystemIoFailure
                        | ErrorCode::DiskFull
                        | ErrorCode::ReadOnly
                        | ErrorCode::PermissionDenied
                        | ErrorCode::OperationInterrupted
                        | ErrorCode::FileLockingProtocolFailed
                        | ErrorCode::SchemaChanged
                )
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn missing_table_is_operational() {
        let conn = Connection::open_in_memory().unwrap();
        let err: StoreError = conn
            .prepare("SELECT name FROM artist")
            .expect_err("artist table does not exist")
            .into();
        assert!(err.is_operational(), "unexpected classification: {err:?}");
    }

    #[test]
    fn constraint_violation_is_not_operational() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT NOT NULL);")
            .unwrap();
        let err: StoreError = conn
            .execute("INSERT INTO t (name) VALUES (NULL)", [])
            .expect_err("NOT NULL should reject the insert")
            .into();
        assert!(!err.is_operational());
    }

    #[test]
    fn directory_and_value_errors_are_not_operational() {
        let dir = StoreError::Directory {
            path: PathBuf::from("/nowhere"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!dir.is_operational());

        let value = StoreError::UnrepresentableValue {
            column: "cover".to_string(),
            kind: "BLOB",
        };
        assert!(!value.is_operational());
        assert_eq!(
            value.to_string(),
            "column 'cover' holds a BLOB value that cannot be rendered as JSON"
        );
    }
}
