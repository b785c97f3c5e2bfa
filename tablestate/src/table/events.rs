//! Notifications sent from the table to its owner.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::column::Column;
use crate::interaction::ColumnOrderChange;
use crate::pipeline::SortDirection;
use crate::value::Value;

/// Sent when a manual-sort column changes direction.
///
/// `rows` is the unsorted input row set at the time of the toggle; the owner
/// is expected to sort (or refetch) and push the result back as rows.
#[derive(Debug, Clone)]
pub struct ManualSortChange<R> {
    pub column_key: String,
    /// `None` when the column returned to unsorted.
    pub direction: Option<SortDirection>,
    pub column: Column<R>,
    pub rows: Vec<R>,
    pub filters: BTreeMap<String, Value>,
}

/// Sent when a manual-filter column receives a new filter value.
#[derive(Debug, Clone)]
pub struct ManualFilterChange<R> {
    pub column_key: String,
    pub value: Value,
    pub column: Column<R>,
    pub rows: Vec<R>,
    /// All filter values, including the new one.
    pub filters: BTreeMap<String, Value>,
}

pub type ColumnOrderHandler = Arc<dyn Fn(&ColumnOrderChange) + Send + Sync>;
pub type ManualSortHandler<R> = Arc<dyn Fn(&ManualSortChange<R>) + Send + Sync>;
pub type ManualFilterHandler<R> = Arc<dyn Fn(&ManualFilterChange<R>) + Send + Sync>;

/// Owner callbacks. Always invoked after the table's lock is released, so a
/// handler may call back into the table.
pub(crate) struct TableHandlers<R> {
    pub on_column_order_change: Option<ColumnOrderHandler>,
    pub on_manual_sort_change: Option<ManualSortHandler<R>>,
    pub on_manual_filter_change: Option<ManualFilterHandler<R>>,
}

impl<R> Default for TableHandlers<R> {
    fn default() -> Self {
        Self {
            on_column_order_change: None,
            on_manual_sort_change: None,
            on_manual_filter_change: None,
        }
    }
}
