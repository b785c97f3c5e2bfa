//! Construction options for [`TableState`](super::TableState).

use std::fmt;
use std::sync::Arc;

use crate::interaction::resize::default_capture;
use crate::interaction::{ColumnOrderChange, PointerCapture};
use crate::persistence::StorageBackend;
use crate::row::RowKey;

use super::events::{
    ColumnOrderHandler, ManualFilterChange, ManualFilterHandler, ManualSortChange,
    ManualSortHandler, TableHandlers,
};

/// Where the table runs.
///
/// A server-side table renders once and never sees pointer events, so
/// persistence, resizing and animation are disabled there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Client,
    Server,
}

impl Environment {
    pub fn is_client(self) -> bool {
        matches!(self, Environment::Client)
    }
}

/// Flags that can change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Flags {
    pub column_dnd: bool,
    pub manual_sort: bool,
    pub manual_filter: bool,
    pub reduced_motion: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            column_dnd: false,
            manual_sort: false,
            manual_filter: false,
            reduced_motion: false,
        }
    }
}

/// Builder for a table.
///
/// ```
/// use tablestate::persistence::MemoryBackend;
/// use tablestate::row::Record;
/// use tablestate::table::TableOptions;
/// use std::sync::Arc;
///
/// let options = TableOptions::<Record>::new()
///     .storage_namespace("orders")
///     .storage(Arc::new(MemoryBackend::new()))
///     .manual_sort(true);
/// assert_eq!(options.namespace(), "orders");
/// ```
pub struct TableOptions<R> {
    pub(crate) storage_namespace: String,
    pub(crate) storage: Option<Arc<dyn StorageBackend>>,
    pub(crate) row_key: RowKey<R>,
    pub(crate) flags: Flags,
    pub(crate) environment: Environment,
    pub(crate) pointer_capture: Arc<dyn PointerCapture>,
    pub(crate) handlers: TableHandlers<R>,
}

impl<R> Default for TableOptions<R> {
    fn default() -> Self {
        Self {
            storage_namespace: "table".to_string(),
            storage: None,
            row_key: RowKey::default(),
            flags: Flags::default(),
            environment: Environment::default(),
            pointer_capture: default_capture(),
            handlers: TableHandlers::default(),
        }
    }
}

impl<R> fmt::Debug for TableOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("storage_namespace", &self.storage_namespace)
            .field("persistent", &self.storage.is_some())
            .field("row_key", &self.row_key)
            .field("flags", &self.flags)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl<R> TableOptions<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&self) -> &str {
        &self.storage_namespace
    }

    /// Prefix for the persisted layout keys.
    pub fn storage_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.storage_namespace = namespace.into();
        self
    }

    /// Backend for layout persistence. Without one nothing is persisted.
    pub fn storage(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(backend);
        self
    }

    pub fn row_key(mut self, row_key: RowKey<R>) -> Self {
        self.row_key = row_key;
        self
    }

    /// Allow header drag-and-drop reordering. Off by default.
    pub fn column_dnd(mut self, enabled: bool) -> Self {
        self.flags.column_dnd = enabled;
        self
    }

    /// The owner sorts rows; the table only tracks sort state.
    pub fn manual_sort(mut self, enabled: bool) -> Self {
        self.flags.manual_sort = enabled;
        self
    }

    /// The owner filters rows; the table only tracks filter values.
    pub fn manual_filter(mut self, enabled: bool) -> Self {
        self.flags.manual_filter = enabled;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Skip the header slide after a reorder.
    pub fn reduced_motion(mut self, enabled: bool) -> Self {
        self.flags.reduced_motion = enabled;
        self
    }

    pub fn pointer_capture(mut self, capture: impl PointerCapture + 'static) -> Self {
        self.pointer_capture = Arc::new(capture);
        self
    }

    pub fn on_column_order_change(
        mut self,
        handler: impl Fn(&ColumnOrderChange) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.on_column_order_change = Some(Arc::new(handler) as ColumnOrderHandler);
        self
    }

    pub fn on_manual_sort_change(
        mut self,
        handler: impl Fn(&ManualSortChange<R>) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.on_manual_sort_change = Some(Arc::new(handler) as ManualSortHandler<R>);
        self
    }

    pub fn on_manual_filter_change(
        mut self,
        handler: impl Fn(&ManualFilterChange<R>) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.on_manual_filter_change = Some(Arc::new(handler) as ManualFilterHandler<R>);
        self
    }
}
