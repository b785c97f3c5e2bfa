//! Storage backend trait.

use super::StorageError;

/// Backend trait for durable key-value storage.
///
/// Implementations handle raw string storage/retrieval.
/// The [`LayoutStore`](super::LayoutStore) wraps this with JSON encoding.
pub trait StorageBackend: Send + Sync {
    /// Get the stored string for a key.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the string stored for a key.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Get all keys matching a prefix.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
