//! Column definitions.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::accessor::Accessor;
use crate::pipeline::SortDirection;
use crate::row::TableRow;
use crate::value::Value;

/// Ascending comparator supplied by a column that sorts rows itself.
pub type SortFn<R> = Arc<dyn Fn(&R, &R) -> Ordering + Send + Sync>;
/// Row predicate supplied by a column that filters rows itself.
pub type FilterFn<R> = Arc<dyn Fn(&R, &Value) -> bool + Send + Sync>;
/// Cell formatter: `(resolved value, row) -> display text`.
pub type Formatter<R> = Arc<dyn Fn(&Value, &R) -> String + Send + Sync>;

/// Column configuration.
///
/// A column is identified by its `key`. The engine only reads columns; to
/// change one, push a new column list through the table's column state.
///
/// A column carrying a sort or filter function is in manual mode for that
/// concern: the engine leaves the row set alone and notifies the caller
/// instead. The functions travel with the column in those notifications, so
/// the caller can apply them with [`Column::apply_sort_function`] and
/// [`Column::apply_filter_function`].
///
/// # Examples
///
/// ```
/// use tablestate::column::Column;
/// use tablestate::row::Record;
///
/// let columns: Vec<Column<Record>> = vec![
///     Column::new("id", "ID"),
///     Column::new("name", "Name").sortable().filterable(),
///     Column::new("city", "City").sort_key("address.city").sortable(),
/// ];
/// assert!(columns[2].sort_accessor().resolve(&Record::new()).is_null());
/// ```
pub struct Column<R> {
    /// Unique identifier
    pub key: String,
    /// Header text
    pub label: String,
    pub sortable: bool,
    pub filterable: bool,
    /// Value used for sorting (defaults to the `key` field).
    pub sort_key: Option<Accessor<R>>,
    /// Value used for filtering (defaults to the `key` field).
    pub filter_key: Option<Accessor<R>>,
    pub sort_function: Option<SortFn<R>>,
    pub filter_function: Option<FilterFn<R>>,
    pub formatter: Option<Formatter<R>>,
    pub header_class: Option<String>,
    pub cell_class: Option<String>,
}

impl<R: TableRow> Column<R> {
    /// Create a new column.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: false,
            filterable: false,
            sort_key: None,
            filter_key: None,
            sort_function: None,
            filter_function: None,
            formatter: None,
            header_class: None,
            cell_class: None,
        }
    }

    /// Make the column sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Make the column filterable.
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn sort_key(mut self, accessor: impl Into<Accessor<R>>) -> Self {
        self.sort_key = Some(accessor.into());
        self
    }

    pub fn filter_key(mut self, accessor: impl Into<Accessor<R>>) -> Self {
        self.filter_key = Some(accessor.into());
        self
    }

    /// Delegate sorting of this column to the caller.
    pub fn sort_function(mut self, f: impl Fn(&R, &R) -> Ordering + Send + Sync + 'static) -> Self {
        self.sort_function = Some(Arc::new(f));
        self
    }

    /// Delegate filtering of this column to the caller.
    pub fn filter_function(mut self, f: impl Fn(&R, &Value) -> bool + Send + Sync + 'static) -> Self {
        self.filter_function = Some(Arc::new(f));
        self
    }

    pub fn formatter(mut self, f: impl Fn(&Value, &R) -> String + Send + Sync + 'static) -> Self {
        self.formatter = Some(Arc::new(f));
        self
    }

    pub fn header_class(mut self, class: impl Into<String>) -> Self {
        self.header_class = Some(class.into());
        self
    }

    pub fn cell_class(mut self, class: impl Into<String>) -> Self {
        self.cell_class = Some(class.into());
        self
    }

    /// Accessor used for automatic sorting.
    pub fn sort_accessor(&self) -> Accessor<R> {
        self.sort_key
            .clone()
            .unwrap_or_else(|| Accessor::path(self.key.as_str()))
    }

    /// Accessor used for automatic filtering.
    pub fn filter_accessor(&self) -> Accessor<R> {
        self.filter_key
            .clone()
            .unwrap_or_else(|| Accessor::path(self.key.as_str()))
    }

    pub fn has_sort_function(&self) -> bool {
        self.sort_function.is_some()
    }

    pub fn has_filter_function(&self) -> bool {
        self.filter_function.is_some()
    }

    /// Value shown in a cell: the `key` field, passed through the formatter
    /// when one is configured.
    pub fn display_value(&self, row: &R) -> Value {
        let value = Accessor::<R>::path(self.key.as_str()).resolve(row);
        match &self.formatter {
            Some(format) => Value::String(format(&value, row)),
            None => value,
        }
    }

    /// Sort `rows` with this column's sort function.
    ///
    /// Returns the rows unchanged when the column has none.
    pub fn apply_sort_function(&self, rows: &[R], direction: Option<SortDirection>) -> Vec<R> {
        let mut sorted = rows.to_vec();
        if let (Some(compare), Some(direction)) = (&self.sort_function, direction) {
            sorted.sort_by(|a, b| direction.apply(compare(a, b)));
        }
        sorted
    }

    /// Keep the rows accepted by this column's filter function.
    ///
    /// Inactive filter values keep every row.
    pub fn apply_filter_function(&self, rows: &[R], value: &Value) -> Vec<R> {
        match &self.filter_function {
            Some(accept) if value.is_filter_active() => {
                rows.iter().filter(|row| accept(row, value)).cloned().collect()
            }
            _ => rows.to_vec(),
        }
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            sortable: self.sortable,
            filterable: self.filterable,
            sort_key: self.sort_key.clone(),
            filter_key: self.filter_key.clone(),
            sort_function: self.sort_function.clone(),
            filter_function: self.filter_function.clone(),
            formatter: self.formatter.clone(),
            header_class: self.header_class.clone(),
            cell_class: self.cell_class.clone(),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("sort_key", &self.sort_key)
            .field("filter_key", &self.filter_key)
            .field("sort_function", &self.sort_function.is_some())
            .field("filter_function", &self.filter_function.is_some())
            .field("formatter", &self.formatter.is_some())
            .finish_non_exhaustive()
    }
}
