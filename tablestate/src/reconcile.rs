//! Per-column layout state and its reconciliation with the column list.

use std::collections::{BTreeMap, HashSet};

use crate::state::Tracked;
use crate::value::Value;

/// Smallest width a column can be resized or restored to.
pub const MIN_COLUMN_WIDTH: f64 = 140.0;

/// Order, visibility, filter and width slots for the known columns.
///
/// Each slot tracks its own revision so derived views only recompute when
/// the slot they read actually changed.
#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    order: Tracked<Vec<String>>,
    enabled: Tracked<Vec<String>>,
    filters: Tracked<BTreeMap<String, Value>>,
    widths: Tracked<BTreeMap<String, f64>>,
}

impl ColumnLayout {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    pub fn order(&self) -> &[String] {
        self.order.get()
    }

    pub fn enabled(&self) -> &[String] {
        self.enabled.get()
    }

    pub fn filters(&self) -> &BTreeMap<String, Value> {
        self.filters.get()
    }

    pub fn widths(&self) -> &BTreeMap<String, f64> {
        self.widths.get()
    }

    pub fn order_revision(&self) -> u64 {
        self.order.revision()
    }

    pub fn enabled_revision(&self) -> u64 {
        self.enabled.revision()
    }

    pub fn filters_revision(&self) -> u64 {
        self.filters.revision()
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.enabled.get().iter().any(|k| k == key)
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    /// Bring every slot in line with `current_keys`.
    ///
    /// Known keys keep their relative order, new keys are appended in column
    /// order, vanished keys are dropped. Filters and widths are rebuilt over
    /// `current_keys`; widths keep only finite values. Running this twice
    /// with the same keys changes nothing the second time.
    ///
    /// Returns `true` if any slot changed.
    pub fn reconcile(&mut self, current_keys: &[String]) -> bool {
        let order = merge_keys(self.order.get(), current_keys);
        let enabled = merge_keys(self.enabled.get(), current_keys);

        let filters: BTreeMap<String, Value> = current_keys
            .iter()
            .map(|key| {
                let value = match self.filters.get().get(key) {
                    Some(existing) if !existing.is_null() => existing.clone(),
                    _ => Value::from(""),
                };
                (key.clone(), value)
            })
            .collect();

        let widths: BTreeMap<String, f64> = current_keys
            .iter()
            .filter_map(|key| {
                let width = *self.widths.get().get(key)?;
                width.is_finite().then(|| (key.clone(), width))
            })
            .collect();

        let mut changed = self.order.set(order);
        changed |= self.enabled.set(enabled);
        changed |= self.filters.set(filters);
        changed |= self.widths.set(widths);
        changed
    }

    /// Reset order and visibility to `keys` and forget every width.
    pub fn reset(&mut self, keys: &[String]) -> bool {
        let mut changed = self.order.set(keys.to_vec());
        changed |= self.enabled.set(keys.to_vec());
        changed |= self.widths.set(BTreeMap::new());
        changed
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    pub fn set_order(&mut self, order: Vec<String>) -> bool {
        self.order.set(order)
    }

    pub fn set_enabled(&mut self, enabled: Vec<String>) -> bool {
        self.enabled.set(enabled)
    }

    pub fn set_widths(&mut self, widths: BTreeMap<String, f64>) -> bool {
        self.widths.set(widths)
    }

    pub fn set_width(&mut self, key: &str, width: f64) -> bool {
        self.widths.update(|widths| {
            widths.insert(key.to_string(), width);
        })
    }

    pub fn set_filter(&mut self, key: &str, value: Value) -> bool {
        self.filters.update(|filters| {
            filters.insert(key.to_string(), value);
        })
    }

    /// Reset every filter slot to the empty string.
    pub fn clear_filters(&mut self) -> bool {
        self.filters.update(|filters| {
            for value in filters.values_mut() {
                *value = Value::from("");
            }
        })
    }

    /// Flip visibility of `key`.
    ///
    /// Hiding the last visible column is refused. Newly shown columns go to
    /// the end of the enabled list. Returns `true` if the set changed.
    pub fn toggle_enabled(&mut self, key: &str) -> bool {
        let enabled = self.enabled.get();
        if enabled.iter().any(|k| k == key) {
            if enabled.len() == 1 {
                return false;
            }
            let next = enabled.iter().filter(|k| *k != key).cloned().collect();
            return self.enabled.set(next);
        }
        let mut next = enabled.clone();
        next.push(key.to_string());
        self.enabled.set(next)
    }
}

/// Keep `existing` keys still in `current`, then append the rest of
/// `current` in its own order. An empty `existing` yields `current`.
pub fn merge_keys(existing: &[String], current: &[String]) -> Vec<String> {
    if existing.is_empty() {
        return current.to_vec();
    }
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let mut merged: Vec<String> = existing
        .iter()
        .filter(|key| current_set.contains(key.as_str()))
        .cloned()
        .collect();
    let kept: HashSet<String> = merged.iter().cloned().collect();
    merged.extend(current.iter().filter(|key| !kept.contains(*key)).cloned());
    merged
}
