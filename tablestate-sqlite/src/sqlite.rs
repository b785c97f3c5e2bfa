//! SQLite layout backend with in-memory cache.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use dashmap::DashMap;
use log::debug;
use rusqlite::{Connection, OptionalExtension};
use tablestate::{StorageBackend, StorageError};

use crate::SqliteStorageError;

/// SQLite-backed layout storage with DashMap cache.
///
/// Reads hit the cache first. Writes go to the database and then the cache,
/// so a failed write never leaves a value only in memory.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    cache: DashMap<String, String>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteStorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        debug!("Opening layout database at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Database that disappears with the process.
    pub fn open_in_memory() -> Result<Self, SqliteStorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, SqliteStorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS layouts (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            cache: DashMap::new(),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, SqliteStorageError> {
        let conn = self.conn.lock().map_err(|_| SqliteStorageError::Poisoned)?;
        Ok(f(&conn)?)
    }
}

impl StorageBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value.clone()));
        }

        let result = self.with_conn(|conn| {
            conn.query_row("SELECT value FROM layouts WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
        })?;

        if let Some(ref value) = result {
            self.cache.insert(key.to_string(), value.clone());
        }

        Ok(result)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO layouts (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, value],
            )
        })?;

        self.cache.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| conn.execute("DELETE FROM layouts WHERE key = ?1", [key]))?;
        self.cache.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let pattern = format!("{}%", prefix);
        let keys = self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM layouts WHERE key LIKE ?1 ORDER BY key")?;
            let rows = stmt.query_map([&pattern], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()
        })?;

        // LIKE treats `_` and `%` in the prefix as wildcards.
        Ok(keys.into_iter().filter(|k| k.starts_with(prefix)).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tablestate::persistence::{LayoutSnapshot, LayoutStore, LoadOutcome};

    use super::*;

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    // =========================================================================
    // Backend
    // =========================================================================

    #[test]
    fn test_set_get_remove() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        assert_eq!(backend.get("a:order").unwrap(), None);

        backend.set("a:order", "[1]").unwrap();
        backend.set("a:order", "[2]").unwrap();
        assert_eq!(backend.get("a:order").unwrap().as_deref(), Some("[2]"));

        backend.remove("a:order").unwrap();
        assert_eq!(backend.get("a:order").unwrap(), None);
    }

    #[test]
    fn test_get_reads_through_to_database() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set("a:widths", "{}").unwrap();
        backend.cache.clear();

        assert_eq!(backend.get("a:widths").unwrap().as_deref(), Some("{}"));
        assert!(backend.cache.contains_key("a:widths"));
    }

    #[test]
    fn test_keys_with_prefix_is_literal() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set("a_b:order", "[]").unwrap();
        backend.set("axb:order", "[]").unwrap();
        backend.set("a_b:widths", "{}").unwrap();

        assert_eq!(
            backend.keys_with_prefix("a_b:").unwrap(),
            keys(&["a_b:order", "a_b:widths"])
        );
    }

    #[test]
    fn test_file_database_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("tablestate-sqlite-{}", std::process::id()));
        let path = dir.join("nested").join("layouts.db");
        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.set("orders:order", r#"["b","a"]"#).unwrap();
        }

        let backend = SqliteBackend::open(&path).unwrap();
        assert_eq!(backend.get("orders:order").unwrap().as_deref(), Some(r#"["b","a"]"#));
        drop(backend);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_error_conversion() {
        let err: StorageError = SqliteStorageError::Poisoned.into();
        assert!(matches!(err, StorageError::Poisoned));
        let err: StorageError = SqliteStorageError::Io(std::io::Error::other("boom")).into();
        assert!(matches!(err, StorageError::Backend(msg) if msg.contains("boom")));
    }

    // =========================================================================
    // Layout Store
    // =========================================================================

    #[test]
    fn test_layout_store_round_trip() {
        let store = LayoutStore::new(Arc::new(SqliteBackend::open_in_memory().unwrap()), "people");
        let mut widths = std::collections::BTreeMap::new();
        widths.insert("name".to_string(), 210.0);
        store
            .save(&LayoutSnapshot {
                order: keys(&["name", "id"]),
                enabled: keys(&["name"]),
                widths: widths.clone(),
            })
            .unwrap();

        let LoadOutcome::Restored(layout) = store.load(&keys(&["id", "name"])) else {
            panic!("expected a restored layout");
        };
        assert_eq!(layout.order, Some(keys(&["name", "id"])));
        assert_eq!(layout.enabled, Some(keys(&["name"])));
        assert_eq!(layout.widths, Some(widths));

        store.clear().unwrap();
        assert_eq!(
            store.load(&keys(&["id", "name"])),
            LoadOutcome::Restored(Default::default())
        );
    }
}
