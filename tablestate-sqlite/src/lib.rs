//! SQLite-backed layout storage for `tablestate`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tablestate::{Record, TableOptions};
//! use tablestate_sqlite::SqliteBackend;
//!
//! let backend = SqliteBackend::open("layouts.db")?;
//! let options = TableOptions::<Record>::new()
//!     .storage_namespace("orders")
//!     .storage(Arc::new(backend));
//! # Ok::<(), tablestate_sqlite::SqliteStorageError>(())
//! ```

mod error;
mod sqlite;

pub use error::SqliteStorageError;
pub use sqlite::SqliteBackend;
