//! Pure derivation steps behind the table views.
//!
//! `TableState` memoizes each step; the functions here never look at
//! anything except their arguments.
//!
//! ```text
//! columns + order ──► ordered ──► visible (enabled keys)
//! rows + ordered + filters ──► filtered ──► sorted (sort state)
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::row::TableRow;
use crate::value::{compare_values, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Orient an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// The single active sort column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub key: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

/// Column definitions in `order`, skipping keys without a definition.
pub fn ordered_columns<R: TableRow>(columns: &[Column<R>], order: &[String]) -> Vec<Column<R>> {
    let by_key: HashMap<&str, &Column<R>> =
        columns.iter().map(|c| (c.key.as_str(), c)).collect();
    order
        .iter()
        .filter_map(|key| by_key.get(key.as_str()).map(|c| (*c).clone()))
        .collect()
}

/// Ordered columns restricted to the enabled keys.
pub fn visible_columns<R: TableRow>(ordered: &[Column<R>], enabled: &[String]) -> Vec<Column<R>> {
    let enabled: HashSet<&str> = enabled.iter().map(String::as_str).collect();
    ordered
        .iter()
        .filter(|c| enabled.contains(c.key.as_str()))
        .cloned()
        .collect()
}

/// Rows matching every active filter.
///
/// Columns with a filter function are skipped: their rows were already
/// narrowed by the caller. With `manual` set, no filtering happens at all.
pub fn filter_rows<R: TableRow>(
    rows: &[R],
    ordered: &[Column<R>],
    filters: &BTreeMap<String, Value>,
    manual: bool,
) -> Vec<R> {
    if manual {
        return rows.to_vec();
    }

    let active: Vec<_> = ordered
        .iter()
        .filter(|column| !column.has_filter_function())
        .filter_map(|column| {
            let value = filters.get(&column.key)?;
            if !value.is_filter_active() {
                return None;
            }
            Some((column.filter_accessor(), value.to_text().to_lowercase()))
        })
        .collect();

    if active.is_empty() {
        return rows.to_vec();
    }

    rows.iter()
        .filter(|row| {
            active.iter().all(|(accessor, needle)| {
                accessor
                    .resolve(row)
                    .to_text()
                    .to_lowercase()
                    .contains(needle.as_str())
            })
        })
        .cloned()
        .collect()
}

/// Rows ordered by the active sort.
///
/// Returns the input order when there is no sort, the sort column is gone,
/// the column sorts rows itself, or the whole table is in manual mode.
pub fn sort_rows<R: TableRow>(
    rows: &[R],
    columns: &[Column<R>],
    sort: Option<&Sort>,
    manual: bool,
) -> Vec<R> {
    let Some(sort) = sort else {
        return rows.to_vec();
    };
    let Some(column) = columns.iter().find(|c| c.key == sort.key) else {
        return rows.to_vec();
    };
    if manual || column.has_sort_function() {
        return rows.to_vec();
    }

    let accessor = column.sort_accessor();
    let mut keyed: Vec<(Value, &R)> = rows.iter().map(|row| (accessor.resolve(row), row)).collect();
    // `sort_by` is stable, so equal keys keep their filtered order.
    keyed.sort_by(|(left, _), (right, _)| sort.direction.apply(compare_values(left, right)));
    keyed.into_iter().map(|(_, row)| row.clone()).collect()
}
