//! Column drag-and-drop reordering.

use serde::Serialize;

/// Transient drag markers: the dragged header and the header under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragState {
    pub source: Option<String>,
    pub over: Option<String>,
}

/// Emitted after a successful drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOrderChange {
    /// The complete new order.
    pub order: Vec<String>,
    pub moved_key: String,
    pub from_index: usize,
    pub to_index: usize,
}

/// Move `source` to the index `target` occupies, both looked up before the
/// move.
///
/// Returns `None` when either key is missing or they are the same key.
///
/// ```
/// use tablestate::interaction::drag::reorder;
///
/// let order: Vec<String> = ["a", "b", "c"].map(String::from).to_vec();
/// assert_eq!(reorder(&order, "a", "c").unwrap().order, ["b", "c", "a"]);
/// assert_eq!(reorder(&order, "c", "a").unwrap().order, ["c", "a", "b"]);
/// assert!(reorder(&order, "b", "b").is_none());
/// ```
pub fn reorder(order: &[String], source: &str, target: &str) -> Option<ColumnOrderChange> {
    if source == target {
        return None;
    }
    let from_index = order.iter().position(|k| k == source)?;
    let to_index = order.iter().position(|k| k == target)?;

    let mut next = order.to_vec();
    let moved_key = next.remove(from_index);
    next.insert(to_index, moved_key.clone());

    Some(ColumnOrderChange {
        order: next,
        moved_key,
        from_index,
        to_index,
    })
}
