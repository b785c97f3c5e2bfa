//! Layout persistence: column order, visibility and widths per namespace.
//!
//! Three entries are written per namespace, each a JSON document:
//!
//! | Key | Payload |
//! |-----|---------|
//! | `<namespace>:order` | array of column keys |
//! | `<namespace>:enabledColumns` | array of column keys |
//! | `<namespace>:widths` | object, column key → number |
//!
//! There is no versioning. Entries that are missing or malformed count as
//! "not persisted".

mod backend;
mod memory;

pub use backend::StorageBackend;
pub use memory::MemoryBackend;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

use crate::reconcile::MIN_COLUMN_WIDTH;

/// Storage error type.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

const ORDER_SEGMENT: &str = "order";
const ENABLED_SEGMENT: &str = "enabledColumns";
const WIDTHS_SEGMENT: &str = "widths";

/// The persisted part of a table layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutSnapshot {
    pub order: Vec<String>,
    pub enabled: Vec<String>,
    pub widths: BTreeMap<String, f64>,
}

/// Layout read back from storage, already validated against the columns
/// that exist now. `None` means the entry was absent or unusable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistedLayout {
    pub order: Option<Vec<String>>,
    pub enabled: Option<Vec<String>>,
    pub widths: Option<BTreeMap<String, f64>>,
}

/// Result of reading a layout.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Restored(PersistedLayout),
    /// Reading or parsing failed; the caller should reset to defaults.
    Fallback,
}

/// Namespaced, JSON-encoded layout storage.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tablestate::persistence::{LayoutSnapshot, LayoutStore, LoadOutcome, MemoryBackend};
///
/// let store = LayoutStore::new(Arc::new(MemoryBackend::new()), "orders");
/// let keys = vec!["id".to_string(), "name".to_string()];
/// store
///     .save(&LayoutSnapshot {
///         order: vec!["name".into(), "id".into()],
///         enabled: keys.clone(),
///         widths: Default::default(),
///     })
///     .unwrap();
///
/// let LoadOutcome::Restored(layout) = store.load(&keys) else { panic!() };
/// assert_eq!(layout.order, Some(vec!["name".to_string(), "id".to_string()]));
/// ```
#[derive(Clone)]
pub struct LayoutStore {
    backend: Arc<dyn StorageBackend>,
    namespace: String,
}

impl std::fmt::Debug for LayoutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl LayoutStore {
    pub fn new(backend: Arc<dyn StorageBackend>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
    }

    /// Full storage key for a segment, e.g. `orders:widths`.
    pub fn key(&self, segment: &str) -> String {
        format!("{}:{}", self.namespace, segment)
    }

    /// Read the layout, validated against `available` column keys.
    ///
    /// Never fails: any storage or parse error yields
    /// [`LoadOutcome::Fallback`] after logging it.
    pub fn load(&self, available: &[String]) -> LoadOutcome {
        match self.try_load(available) {
            Ok(layout) => {
                debug!("Loaded layout for '{}': {:?}", self.namespace, layout);
                LoadOutcome::Restored(layout)
            }
            Err(e) => {
                warn!("Discarding persisted layout for '{}': {}", self.namespace, e);
                LoadOutcome::Fallback
            }
        }
    }

    fn try_load(&self, available: &[String]) -> Result<PersistedLayout, StorageError> {
        let available_set: HashSet<&str> = available.iter().map(String::as_str).collect();

        let order = self
            .read_json(ORDER_SEGMENT)?
            .and_then(|value| key_list(&value, &available_set))
            .map(|mut order| {
                let present: HashSet<String> = order.iter().cloned().collect();
                order.extend(available.iter().filter(|k| !present.contains(*k)).cloned());
                order
            });

        let enabled = self
            .read_json(ENABLED_SEGMENT)?
            .and_then(|value| key_list(&value, &available_set))
            .filter(|enabled| !enabled.is_empty());

        let widths = self.read_json(WIDTHS_SEGMENT)?.and_then(|value| {
            let object = value.as_object()?;
            Some(
                available
                    .iter()
                    .filter_map(|key| {
                        let width = object.get(key)?.as_f64()?;
                        (width.is_finite() && width >= MIN_COLUMN_WIDTH)
                            .then(|| (key.clone(), width))
                    })
                    .collect(),
            )
        });

        Ok(PersistedLayout {
            order,
            enabled,
            widths,
        })
    }

    fn read_json(&self, segment: &str) -> Result<Option<serde_json::Value>, StorageError> {
        match self.backend.get(&self.key(segment))? {
            Some(raw) if !raw.is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// Overwrite all three entries.
    pub fn save(&self, layout: &LayoutSnapshot) -> Result<(), StorageError> {
        self.backend
            .set(&self.key(ORDER_SEGMENT), &serde_json::to_string(&layout.order)?)?;
        self.backend
            .set(&self.key(ENABLED_SEGMENT), &serde_json::to_string(&layout.enabled)?)?;
        self.backend
            .set(&self.key(WIDTHS_SEGMENT), &serde_json::to_string(&layout.widths)?)?;
        Ok(())
    }

    /// Remove every entry under the namespace, including keys that are no
    /// longer written.
    pub fn clear(&self) -> Result<(), StorageError> {
        let keys = self.backend.keys_with_prefix(&self.key(""))?;
        for key in &keys {
            self.backend.remove(key)?;
        }
        debug!("Cleared {} layout entries for '{}'", keys.len(), self.namespace);
        Ok(())
    }
}

/// String entries of a JSON array that name an available column, without
/// duplicates. Non-arrays yield `None`.
fn key_list(value: &serde_json::Value, available: &HashSet<&str>) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let mut seen = HashSet::new();
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str())
            .filter(|key| available.contains(key) && seen.insert(*key))
            .map(str::to_string)
            .collect(),
    )
}
