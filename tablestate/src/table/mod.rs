//! The table engine.
//!
//! [`TableState`] owns the layout (order, visibility, widths, filters, sort)
//! for a column list and a row set that the caller owns through
//! [`State`] handles. It keeps the layout reconciled with the column list,
//! persists it, drives the drag and resize gestures, and serves memoized
//! views for rendering.
//!
//! Every method takes `&self`; clones share the same table.

mod events;
mod options;

pub use events::{
    ColumnOrderHandler, ManualFilterChange, ManualFilterHandler, ManualSortChange,
    ManualSortHandler,
};
pub use options::{Environment, TableOptions};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, trace, warn};

use crate::column::Column;
use crate::interaction::{
    ColumnOrderChange, DragState, Gesture, HeaderElement, HeaderRegistry, HeaderSlide,
    PointerCapture, ResizeSession, ResizeState, reorder,
};
use crate::persistence::{LayoutSnapshot, LayoutStore, LoadOutcome};
use crate::pipeline::{self, Sort, SortDirection};
use crate::reconcile::{ColumnLayout, MIN_COLUMN_WIDTH};
use crate::row::{RowKey, TableRow};
use crate::state::{Memo, State, Tracked};
use crate::value::Value;

use events::TableHandlers;
use options::Flags;

/// Inline sizing for a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnStyle {
    /// Used as both width and minimum width. `None` leaves sizing to the
    /// host's layout.
    pub width: Option<f64>,
}

impl ColumnStyle {
    pub fn is_empty(&self) -> bool {
        self.width.is_none()
    }

    /// `width` and `min-width` declarations, or an empty string.
    ///
    /// ```
    /// use tablestate::table::ColumnStyle;
    ///
    /// let style = ColumnStyle { width: Some(230.0) };
    /// assert_eq!(style.css(), "width: 230px; min-width: 230px;");
    /// assert_eq!(ColumnStyle::default().css(), "");
    /// ```
    pub fn css(&self) -> String {
        match self.width {
            Some(width) => format!("width: {width}px; min-width: {width}px;"),
            None => String::new(),
        }
    }
}

/// Internal state behind the lock.
struct TableInner<R: TableRow> {
    layout: ColumnLayout,
    sort: Tracked<Option<Sort>>,
    flags: Tracked<Flags>,
    gesture: Gesture,
    headers: HeaderRegistry,
    store: Option<LayoutStore>,
    environment: Environment,
    row_key: RowKey<R>,
    pointer_capture: Arc<dyn PointerCapture>,
    mounted: bool,
    /// Nothing is written until the persisted layout has been read.
    persistence_loaded: bool,
    last_saved: Option<LayoutSnapshot>,
    /// Column revision the layout was last reconciled against.
    reconciled_revision: Option<u64>,
    /// Header positions captured before a reorder, waiting for the flush.
    pending_positions: Option<HashMap<String, f64>>,
    columns_memo: Memo<Vec<Column<R>>>,
    rows_memo: Memo<Vec<R>>,
    ordered_memo: Memo<Vec<Column<R>>>,
    visible_memo: Memo<Vec<Column<R>>>,
    filtered_memo: Memo<Vec<R>>,
    sorted_memo: Memo<Vec<R>>,
}

impl<R: TableRow> TableInner<R> {
    fn new(options: &TableOptions<R>) -> Self {
        let store = options
            .storage
            .as_ref()
            .map(|backend| LayoutStore::new(Arc::clone(backend), options.storage_namespace.clone()));
        Self {
            layout: ColumnLayout::new(),
            sort: Tracked::new(None),
            flags: Tracked::new(options.flags),
            gesture: Gesture::Idle,
            headers: HeaderRegistry::default(),
            store,
            environment: options.environment,
            row_key: options.row_key.clone(),
            pointer_capture: Arc::clone(&options.pointer_capture),
            mounted: false,
            persistence_loaded: false,
            last_saved: None,
            reconciled_revision: None,
            pending_positions: None,
            columns_memo: Memo::default(),
            rows_memo: Memo::default(),
            ordered_memo: Memo::default(),
            visible_memo: Memo::default(),
            filtered_memo: Memo::default(),
            sorted_memo: Memo::default(),
        }
    }

    fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            order: self.layout.order().to_vec(),
            enabled: self.layout.enabled().to_vec(),
            widths: self.layout.widths().clone(),
        }
    }

    /// Write the layout if it differs from the last one written.
    fn persist_if_changed(&mut self) {
        if !self.persistence_loaded || !self.environment.is_client() {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = self.snapshot();
        if self.last_saved.as_ref() == Some(&snapshot) {
            return;
        }
        match store.save(&snapshot) {
            Ok(()) => trace!("Saved layout for '{}'", store.namespace()),
            Err(e) => warn!("Failed to save layout for '{}': {}", store.namespace(), e),
        }
        self.last_saved = Some(snapshot);
    }

    /// Apply the persisted layout on top of the reconciled one.
    fn restore(&mut self, keys: &[String]) {
        let Some(store) = &self.store else {
            return;
        };
        match store.load(keys) {
            LoadOutcome::Restored(persisted) => {
                if let Some(order) = persisted.order {
                    self.layout.set_order(order);
                }
                if let Some(enabled) = persisted.enabled {
                    self.layout.set_enabled(enabled);
                }
                if let Some(widths) = persisted.widths {
                    self.layout.set_widths(widths);
                }
            }
            LoadOutcome::Fallback => {
                self.layout.reset(keys);
            }
        }
    }

    fn is_manual_sort(&self, column: &Column<R>) -> bool {
        column.has_sort_function() || self.flags.get().manual_sort
    }

    fn is_manual_filter(&self, column: &Column<R>) -> bool {
        column.has_filter_function() || self.flags.get().manual_filter
    }
}

/// Column layout, sorting, filtering and gesture state for one table.
///
/// # Example
///
/// ```
/// use tablestate::column::Column;
/// use tablestate::row::Record;
/// use tablestate::state::State;
/// use tablestate::table::{TableOptions, TableState};
///
/// let columns = State::new(vec![
///     Column::new("id", "ID").sortable(),
///     Column::new("name", "Name").filterable(),
/// ]);
/// let rows = State::new(vec![
///     Record::new().set("id", 2).set("name", "Bea"),
///     Record::new().set("id", 1).set("name", "Ada"),
/// ]);
///
/// let table = TableState::new(columns, rows, TableOptions::new());
/// table.mount();
/// table.toggle_sort("id");
/// let sorted = table.sorted_rows();
/// assert_eq!(sorted[0].get("name").and_then(|v| v.as_str()), Some("Ada"));
/// ```
#[derive(Clone)]
pub struct TableState<R: TableRow> {
    inner: Arc<RwLock<TableInner<R>>>,
    columns: State<Vec<Column<R>>>,
    rows: State<Vec<R>>,
    handlers: Arc<TableHandlers<R>>,
    /// Dirty flag for re-render.
    dirty: Arc<AtomicBool>,
}

impl<R: TableRow> fmt::Debug for TableState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("TableState");
        if let Ok(guard) = self.inner.read() {
            debug
                .field("order", &guard.layout.order())
                .field("enabled", &guard.layout.enabled())
                .field("sort", guard.sort.get())
                .field("gesture", &guard.gesture)
                .field("mounted", &guard.mounted);
        }
        debug.finish_non_exhaustive()
    }
}

impl<R: TableRow> TableState<R> {
    /// Create a table over caller-owned columns and rows.
    ///
    /// The layout is reconciled with the columns right away; the persisted
    /// layout is read on [`mount`](Self::mount).
    pub fn new(columns: State<Vec<Column<R>>>, rows: State<Vec<R>>, options: TableOptions<R>) -> Self {
        let inner = TableInner::new(&options);
        let table = Self {
            inner: Arc::new(RwLock::new(inner)),
            columns,
            rows,
            handlers: Arc::new(options.handlers),
            dirty: Arc::new(AtomicBool::new(true)),
        };
        if let Ok(mut guard) = table.inner.write() {
            table.sync(&mut guard);
        }
        table
    }

    /// The column list handle. Writes are picked up on the next access.
    pub fn columns(&self) -> &State<Vec<Column<R>>> {
        &self.columns
    }

    /// The row set handle.
    pub fn rows(&self) -> &State<Vec<R>> {
        &self.rows
    }

    /// Replace the column list and reconcile the layout with it.
    pub fn set_columns(&self, columns: Vec<Column<R>>) {
        self.columns.set(columns);
        if let Ok(mut guard) = self.inner.write() {
            self.sync(&mut guard);
        }
        self.mark_dirty();
    }

    pub fn set_rows(&self, rows: Vec<R>) {
        self.rows.set(rows);
        self.mark_dirty();
    }

    /// Check if the table needs re-rendering.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Clear the dirty flag.
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Read the persisted layout and start persisting changes.
    ///
    /// Call once the table is live on the client. Calling it again does
    /// nothing.
    pub fn mount(&self) {
        if let Ok(mut guard) = self.inner.write() {
            if guard.mounted {
                return;
            }
            guard.mounted = true;
            self.sync(&mut guard);
            if guard.environment.is_client() {
                let keys = self.column_keys();
                guard.restore(&keys);
            }
            guard.persistence_loaded = true;
            guard.persist_if_changed();
            debug!("Mounted table with order {:?}", guard.layout.order());
            self.mark_dirty();
        }
    }

    /// End any gesture in progress and release its pointer capture.
    pub fn teardown(&self) {
        let previous = match self.inner.write() {
            Ok(mut guard) => {
                guard.pending_positions = None;
                std::mem::take(&mut guard.gesture)
            }
            Err(_) => return,
        };
        if !matches!(previous, Gesture::Idle) {
            debug!("Teardown ended {:?}", previous);
        }
        drop(previous);
    }

    /// Forget the persisted layout and return to the column list's own
    /// order, all columns visible and no stored widths.
    pub fn reset_layout(&self) {
        if let Ok(mut guard) = self.inner.write() {
            self.sync(&mut guard);
            let keys = self.column_keys();
            guard.layout.reset(&keys);
            if guard.environment.is_client()
                && let Some(store) = &guard.store
            {
                if let Err(e) = store.clear() {
                    warn!("Failed to clear layout for '{}': {}", store.namespace(), e);
                }
                if guard.persistence_loaded {
                    guard.last_saved = Some(guard.snapshot());
                }
            }
            debug!("Reset layout to {:?}", keys);
            self.mark_dirty();
        }
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    pub fn set_column_dnd(&self, enabled: bool) {
        self.update_flags(|flags| flags.column_dnd = enabled);
    }

    pub fn set_manual_sort(&self, enabled: bool) {
        self.update_flags(|flags| flags.manual_sort = enabled);
    }

    pub fn set_manual_filter(&self, enabled: bool) {
        self.update_flags(|flags| flags.manual_filter = enabled);
    }

    pub fn set_reduced_motion(&self, enabled: bool) {
        self.update_flags(|flags| flags.reduced_motion = enabled);
    }

    fn update_flags(&self, f: impl FnOnce(&mut Flags)) {
        if let Ok(mut guard) = self.inner.write()
            && guard.flags.update(f)
        {
            self.mark_dirty();
        }
    }

    /// Move persistence to another namespace. The current layout is written
    /// there on the next save; nothing is read back.
    pub fn set_storage_namespace(&self, namespace: impl Into<String>) {
        if let Ok(mut guard) = self.inner.write() {
            let namespace = namespace.into();
            let Some(store) = guard.store.as_mut() else {
                return;
            };
            if store.namespace() == namespace {
                return;
            }
            store.set_namespace(namespace);
            guard.last_saved = None;
            guard.persist_if_changed();
        }
    }

    pub fn storage_namespace(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.store.as_ref().map(|s| s.namespace().to_string()))
    }

    pub fn environment(&self) -> Environment {
        self.inner
            .read()
            .map(|g| g.environment)
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Derived views
    // -------------------------------------------------------------------------

    /// Column definitions in display order, hidden ones included.
    pub fn ordered_columns(&self) -> Arc<Vec<Column<R>>> {
        self.with_inner(|inner| self.ordered(inner)).unwrap_or_default()
    }

    /// Ordered columns that are enabled.
    pub fn visible_columns(&self) -> Arc<Vec<Column<R>>> {
        self.with_inner(|inner| self.visible(inner)).unwrap_or_default()
    }

    /// Rows passing every active filter.
    pub fn filtered_rows(&self) -> Arc<Vec<R>> {
        self.with_inner(|inner| self.filtered(inner)).unwrap_or_default()
    }

    /// Filtered rows in sort order. This is what a view renders.
    pub fn sorted_rows(&self) -> Arc<Vec<R>> {
        self.with_inner(|inner| self.sorted(inner)).unwrap_or_default()
    }

    /// Cell value for `row` in `column`, formatter applied.
    pub fn display_value(&self, row: &R, column: &Column<R>) -> Value {
        column.display_value(row)
    }

    /// Stable identity for a rendered row.
    pub fn row_key(&self, row: &R, index: usize) -> String {
        self.inner
            .read()
            .map(|g| g.row_key.resolve(row, index))
            .unwrap_or_else(|_| index.to_string())
    }

    /// Lock, reconcile with the column list if it moved, and run `f`.
    fn with_inner<T>(&self, f: impl FnOnce(&mut TableInner<R>) -> T) -> Option<T> {
        let mut guard = self.inner.write().ok()?;
        self.sync(&mut guard);
        Some(f(&mut guard))
    }

    fn column_keys(&self) -> Vec<String> {
        self.columns
            .with(|columns| columns.iter().map(|c| c.key.clone()).collect())
    }

    /// Reconcile the layout if the column list changed since last time.
    fn sync(&self, inner: &mut TableInner<R>) {
        let revision = self.columns.revision();
        if inner.reconciled_revision == Some(revision) {
            return;
        }
        let keys = self.column_keys();
        if inner.layout.reconcile(&keys) {
            debug!("Reconciled layout with columns {:?}", keys);
            self.mark_dirty();
        }
        inner.reconciled_revision = Some(revision);
        inner.persist_if_changed();
    }

    fn all_columns(&self, inner: &mut TableInner<R>) -> Arc<Vec<Column<R>>> {
        let revision = self.columns.revision();
        inner
            .columns_memo
            .get_or_compute(&[revision], || self.columns.get())
    }

    fn all_rows(&self, inner: &mut TableInner<R>) -> Arc<Vec<R>> {
        let revision = self.rows.revision();
        inner.rows_memo.get_or_compute(&[revision], || self.rows.get())
    }

    fn ordered(&self, inner: &mut TableInner<R>) -> Arc<Vec<Column<R>>> {
        let columns = self.all_columns(inner);
        let deps = [self.columns.revision(), inner.layout.order_revision()];
        let layout = &inner.layout;
        inner
            .ordered_memo
            .get_or_compute(&deps, || pipeline::ordered_columns(&columns, layout.order()))
    }

    fn visible(&self, inner: &mut TableInner<R>) -> Arc<Vec<Column<R>>> {
        let ordered = self.ordered(inner);
        let deps = [
            self.columns.revision(),
            inner.layout.order_revision(),
            inner.layout.enabled_revision(),
        ];
        let layout = &inner.layout;
        inner
            .visible_memo
            .get_or_compute(&deps, || pipeline::visible_columns(&ordered, layout.enabled()))
    }

    fn filter_deps(&self, inner: &TableInner<R>) -> [u64; 5] {
        [
            self.rows.revision(),
            self.columns.revision(),
            inner.layout.order_revision(),
            inner.layout.filters_revision(),
            inner.flags.revision(),
        ]
    }

    fn filtered(&self, inner: &mut TableInner<R>) -> Arc<Vec<R>> {
        let rows = self.all_rows(inner);
        let ordered = self.ordered(inner);
        let deps = self.filter_deps(inner);
        let layout = &inner.layout;
        let manual = inner.flags.get().manual_filter;
        inner.filtered_memo.get_or_compute(&deps, || {
            pipeline::filter_rows(&rows, &ordered, layout.filters(), manual)
        })
    }

    fn sorted(&self, inner: &mut TableInner<R>) -> Arc<Vec<R>> {
        let filtered = self.filtered(inner);
        let columns = self.all_columns(inner);
        let [a, b, c, d, e] = self.filter_deps(inner);
        let deps = [a, b, c, d, e, inner.sort.revision()];
        let sort = inner.sort.get().clone();
        let manual = inner.flags.get().manual_sort;
        inner.sorted_memo.get_or_compute(&deps, || {
            pipeline::sort_rows(&filtered, &columns, sort.as_ref(), manual)
        })
    }

    // -------------------------------------------------------------------------
    // Layout access
    // -------------------------------------------------------------------------

    /// Column keys in display order.
    pub fn column_order(&self) -> Vec<String> {
        self.with_inner(|inner| inner.layout.order().to_vec())
            .unwrap_or_default()
    }

    pub fn enabled_column_keys(&self) -> Vec<String> {
        self.with_inner(|inner| inner.layout.enabled().to_vec())
            .unwrap_or_default()
    }

    pub fn is_column_enabled(&self, key: &str) -> bool {
        self.with_inner(|inner| inner.layout.is_enabled(key))
            .unwrap_or(false)
    }

    pub fn column_widths(&self) -> BTreeMap<String, f64> {
        self.with_inner(|inner| inner.layout.widths().clone())
            .unwrap_or_default()
    }

    /// Stored width for `key`, if the column was ever resized.
    pub fn column_width(&self, key: &str) -> Option<f64> {
        self.with_inner(|inner| inner.layout.widths().get(key).copied())
            .flatten()
    }

    /// Inline style for the cells of `key`. Empty until the column has a
    /// non-zero width; never narrower than the minimum width.
    pub fn column_style(&self, key: &str) -> ColumnStyle {
        let width = self
            .column_width(key)
            .filter(|width| *width != 0.0 && !width.is_nan());
        ColumnStyle {
            width: width.map(|width| width.max(MIN_COLUMN_WIDTH)),
        }
    }

    // -------------------------------------------------------------------------
    // Visibility
    // -------------------------------------------------------------------------

    /// Show or hide a column.
    ///
    /// Hiding the only visible column is refused. Returns `true` if the
    /// visible set changed.
    pub fn toggle_column(&self, key: &str) -> bool {
        let Ok(mut guard) = self.inner.write() else {
            return false;
        };
        self.sync(&mut guard);
        if !guard.layout.order().iter().any(|k| k == key) {
            trace!("Ignoring toggle of unknown column '{}'", key);
            return false;
        }
        if !guard.layout.toggle_enabled(key) {
            debug!("Refusing to hide the last visible column '{}'", key);
            return false;
        }
        debug!("Toggled column '{}', enabled: {:?}", key, guard.layout.enabled());
        guard.persist_if_changed();
        self.mark_dirty();
        true
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// The active sort, if any.
    pub fn sort(&self) -> Option<Sort> {
        self.inner.read().ok().and_then(|g| g.sort.get().clone())
    }

    /// Direction `key` is sorted in, or `None` if it is not the sort column.
    pub fn sort_direction(&self, key: &str) -> Option<SortDirection> {
        self.inner.read().ok().and_then(|g| {
            g.sort
                .get()
                .as_ref()
                .filter(|sort| sort.key == key)
                .map(|sort| sort.direction)
        })
    }

    /// Advance the sort of `key`: unsorted, ascending, descending, unsorted.
    ///
    /// Another column's sort is replaced and restarts at ascending. Unknown
    /// and non-sortable columns are ignored. Returns the new direction.
    pub fn toggle_sort(&self, key: &str) -> Option<SortDirection> {
        let (direction, notice) = {
            let Ok(mut guard) = self.inner.write() else {
                return None;
            };
            self.sync(&mut guard);
            let columns = self.all_columns(&mut guard);
            let Some(column) = columns.iter().find(|c| c.key == key) else {
                trace!("Ignoring sort on unknown column '{}'", key);
                return None;
            };
            if !column.sortable {
                trace!("Ignoring sort on unsortable column '{}'", key);
                return None;
            }

            let direction = match guard.sort.get() {
                Some(sort) if sort.key == key => match sort.direction {
                    SortDirection::Asc => Some(SortDirection::Desc),
                    SortDirection::Desc => None,
                },
                _ => Some(SortDirection::Asc),
            };
            guard.sort.set(direction.map(|d| Sort::new(key, d)));
            debug!("Sort on '{}' is now {:?}", key, direction);
            self.mark_dirty();

            let notice = guard.is_manual_sort(column).then(|| ManualSortChange {
                column_key: key.to_string(),
                direction,
                column: column.clone(),
                rows: self.rows.get(),
                filters: guard.layout.filters().clone(),
            });
            (direction, notice)
        };

        if let (Some(notice), Some(handler)) = (notice, &self.handlers.on_manual_sort_change) {
            handler(&notice);
        }
        direction
    }

    /// Drop the active sort.
    pub fn clear_sort(&self) {
        let notice = {
            let Ok(mut guard) = self.inner.write() else {
                return;
            };
            self.sync(&mut guard);
            let Some(previous) = guard.sort.get().clone() else {
                return;
            };
            guard.sort.set(None);
            debug!("Cleared sort on '{}'", previous.key);
            self.mark_dirty();

            let columns = self.all_columns(&mut guard);
            columns
                .iter()
                .find(|c| c.key == previous.key)
                .filter(|c| guard.is_manual_sort(c))
                .map(|column| ManualSortChange {
                    column_key: previous.key.clone(),
                    direction: None,
                    column: column.clone(),
                    rows: self.rows.get(),
                    filters: guard.layout.filters().clone(),
                })
        };

        if let (Some(notice), Some(handler)) = (notice, &self.handlers.on_manual_sort_change) {
            handler(&notice);
        }
    }

    // -------------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------------

    /// All filter values by column key.
    pub fn filters(&self) -> BTreeMap<String, Value> {
        self.with_inner(|inner| inner.layout.filters().clone())
            .unwrap_or_default()
    }

    /// Filter value for `key`; an empty string when unset.
    pub fn filter(&self, key: &str) -> Value {
        self.with_inner(|inner| inner.layout.filters().get(key).cloned())
            .flatten()
            .unwrap_or_else(|| Value::from(""))
    }

    /// Store a filter value for `key`.
    ///
    /// Columns that filter rows themselves, and every column of a manual
    /// filter table, notify the owner instead of narrowing the rows.
    pub fn set_filter(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let notice = {
            let Ok(mut guard) = self.inner.write() else {
                return;
            };
            self.sync(&mut guard);
            if guard.layout.set_filter(key, value.clone()) {
                trace!("Filter on '{}' is now {:?}", key, value);
                self.mark_dirty();
            }

            let columns = self.all_columns(&mut guard);
            columns
                .iter()
                .find(|c| c.key == key)
                .filter(|c| guard.is_manual_filter(c))
                .map(|column| ManualFilterChange {
                    column_key: key.to_string(),
                    value,
                    column: column.clone(),
                    rows: self.rows.get(),
                    filters: guard.layout.filters().clone(),
                })
        };

        if let (Some(notice), Some(handler)) = (notice, &self.handlers.on_manual_filter_change) {
            handler(&notice);
        }
    }

    /// Reset every filter to the empty string.
    ///
    /// Manual-filter columns whose filter was active are notified one by one.
    pub fn clear_filters(&self) {
        let notices = {
            let Ok(mut guard) = self.inner.write() else {
                return;
            };
            self.sync(&mut guard);
            let previous = guard.layout.filters().clone();
            if !guard.layout.clear_filters() {
                return;
            }
            debug!("Cleared filters");
            self.mark_dirty();

            let columns = self.all_columns(&mut guard);
            let rows = self.rows.get();
            let filters = guard.layout.filters().clone();
            columns
                .iter()
                .filter(|c| guard.is_manual_filter(c))
                .filter(|c| previous.get(&c.key).is_some_and(Value::is_filter_active))
                .map(|column| ManualFilterChange {
                    column_key: column.key.clone(),
                    value: Value::from(""),
                    column: column.clone(),
                    rows: rows.clone(),
                    filters: filters.clone(),
                })
                .collect::<Vec<_>>()
        };

        if let Some(handler) = &self.handlers.on_manual_filter_change {
            for notice in &notices {
                handler(notice);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Drag reorder
    // -------------------------------------------------------------------------

    pub fn drag_state(&self) -> DragState {
        self.inner
            .read()
            .map(|g| g.gesture.drag_state())
            .unwrap_or_default()
    }

    pub fn drag_source(&self) -> Option<String> {
        self.drag_state().source
    }

    pub fn drag_over_key(&self) -> Option<String> {
        self.drag_state().over
    }

    /// Start dragging the header of `key`.
    pub fn drag_start(&self, key: &str) {
        if let Ok(mut guard) = self.inner.write() {
            if !guard.flags.get().column_dnd {
                trace!("Column drag disabled, ignoring drag of '{}'", key);
                return;
            }
            if guard.gesture.is_resizing() {
                trace!("Resize in progress, ignoring drag of '{}'", key);
                return;
            }
            guard.gesture = Gesture::Dragging {
                source: key.to_string(),
                over: None,
            };
            trace!("Drag started on '{}'", key);
            self.mark_dirty();
        }
    }

    /// The dragged header is over the header of `key`.
    pub fn drag_over(&self, key: &str) {
        if let Ok(mut guard) = self.inner.write() {
            if !guard.flags.get().column_dnd {
                return;
            }
            if let Gesture::Dragging { source, over } = &mut guard.gesture
                && source.as_str() != key
                && over.as_deref() != Some(key)
            {
                *over = Some(key.to_string());
                self.mark_dirty();
            }
        }
    }

    /// The dragged header left the header of `key`.
    pub fn drag_leave(&self, key: &str) {
        if let Ok(mut guard) = self.inner.write()
            && let Gesture::Dragging { over, .. } = &mut guard.gesture
            && over.as_deref() == Some(key)
        {
            *over = None;
            self.mark_dirty();
        }
    }

    /// Drop the dragged header onto the header of `target`.
    ///
    /// The dragged column takes the index `target` held, and the owner is
    /// notified with the new order. The drag ends either way. Returns the
    /// change when the order moved.
    pub fn drop(&self, target: &str) -> Option<ColumnOrderChange> {
        let change = {
            let Ok(mut guard) = self.inner.write() else {
                return None;
            };
            self.sync(&mut guard);
            let source = match &guard.gesture {
                Gesture::Dragging { source, .. } => Some(source.clone()),
                _ => None,
            };
            if source.is_some() {
                guard.gesture = Gesture::Idle;
                self.mark_dirty();
            }
            if !guard.flags.get().column_dnd {
                trace!("Column drag disabled, ignoring drop on '{}'", target);
                return None;
            }
            let Some(source) = source else {
                trace!("No drag in progress, ignoring drop on '{}'", target);
                return None;
            };
            let Some(change) = reorder(guard.layout.order(), &source, target) else {
                trace!("Drop of '{}' on '{}' changes nothing", source, target);
                return None;
            };

            if guard.environment.is_client() {
                let visible = self.visible(&mut guard);
                let positions = guard
                    .headers
                    .positions(visible.iter().map(|c| c.key.as_str()));
                guard.pending_positions = Some(positions);
            }
            guard.layout.set_order(change.order.clone());
            debug!(
                "Moved column '{}' from {} to {}",
                change.moved_key, change.from_index, change.to_index
            );
            guard.persist_if_changed();
            change
        };

        if let Some(handler) = &self.handlers.on_column_order_change {
            handler(&change);
        }
        Some(change)
    }

    /// The drag ended without a drop.
    pub fn drag_end(&self) {
        if let Ok(mut guard) = self.inner.write()
            && guard.gesture.is_dragging()
        {
            guard.gesture = Gesture::Idle;
            trace!("Drag ended");
            self.mark_dirty();
        }
    }

    /// Register the rendered header of `key`, or forget it with `None`.
    pub fn register_header(&self, key: &str, element: Option<Arc<dyn HeaderElement>>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.headers.register(key, element);
        }
    }

    /// Slide headers displaced by the last reorder into place.
    ///
    /// Call after rendering the new order. Returns the slides that were
    /// started; empty when nothing is pending, motion is reduced, or the
    /// table is not on the client.
    pub fn flush_reorder_animation(&self) -> Vec<HeaderSlide> {
        let (before, headers) = {
            let Ok(mut guard) = self.inner.write() else {
                return Vec::new();
            };
            let Some(before) = guard.pending_positions.take() else {
                return Vec::new();
            };
            if guard.flags.get().reduced_motion || !guard.environment.is_client() {
                trace!("Skipping reorder animation");
                return Vec::new();
            }
            (before, guard.headers.clone())
        };
        headers.animate_from(&before)
    }

    // -------------------------------------------------------------------------
    // Resize
    // -------------------------------------------------------------------------

    pub fn active_resize(&self) -> Option<ResizeState> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.gesture.resize_session().map(|s| s.state().clone()))
    }

    pub fn is_resizing(&self) -> bool {
        self.inner
            .read()
            .map(|g| g.gesture.is_resizing())
            .unwrap_or(false)
    }

    /// Start resizing `key` with the pointer at `pointer_x`.
    ///
    /// Ends any drag, and any earlier resize. The earlier gesture releases
    /// its capture before the new one is taken, and capture is held until
    /// the resize ends.
    pub fn resize_start(&self, pointer_x: f64, key: &str) {
        let (capture, previous) = match self.inner.write() {
            Ok(mut guard) if guard.environment.is_client() => (
                Arc::clone(&guard.pointer_capture),
                std::mem::take(&mut guard.gesture),
            ),
            _ => {
                trace!("Ignoring resize of '{}' outside the client", key);
                return;
            }
        };
        drop(previous);
        let handle = capture.capture();

        let Ok(mut guard) = self.inner.write() else {
            return;
        };
        self.sync(&mut guard);
        let start_width = guard
            .layout
            .widths()
            .get(key)
            .copied()
            .or_else(|| guard.headers.width(key))
            .unwrap_or(MIN_COLUMN_WIDTH);
        let session = ResizeSession::new(key, pointer_x, start_width, handle);
        debug!(
            "Resize started on '{}' at width {}",
            key,
            session.state().start_width
        );
        let displaced = std::mem::replace(&mut guard.gesture, Gesture::Resizing(session));
        self.mark_dirty();
        drop(guard);
        drop(displaced);
    }

    /// Follow the pointer. Returns the new width while a resize is active.
    pub fn resize_move(&self, pointer_x: f64) -> Option<f64> {
        let mut guard = self.inner.write().ok()?;
        self.sync(&mut guard);
        let session = guard.gesture.resize_session()?;
        let key = session.column_key().to_string();
        let width = session.width_at(pointer_x);
        if guard.layout.set_width(&key, width) {
            guard.persist_if_changed();
            self.mark_dirty();
        }
        Some(width)
    }

    /// Finish the resize and release pointer capture.
    pub fn resize_end(&self) {
        let previous = {
            let Ok(mut guard) = self.inner.write() else {
                return;
            };
            if !guard.gesture.is_resizing() {
                return;
            }
            self.mark_dirty();
            std::mem::take(&mut guard.gesture)
        };
        if let Some(session) = previous.resize_session() {
            debug!("Resize ended on '{}'", session.column_key());
        }
        drop(previous);
    }
}
