use tablestate::StorageError;
use thiserror::Error;

/// Errors raised while opening or querying the layout database.
#[derive(Debug, Error)]
pub enum SqliteStorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection lock poisoned")]
    Poisoned,
}

impl From<SqliteStorageError> for StorageError {
    fn from(e: SqliteStorageError) -> Self {
        match e {
            SqliteStorageError::Poisoned => StorageError::Poisoned,
            other => StorageError::Backend(other.to_string()),
        }
    }
}
