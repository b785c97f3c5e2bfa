//! Data table state engine
//!
//! Column order, visibility, widths, filters and sort for a table whose
//! columns and rows are owned by the caller, with drag-to-reorder and
//! drag-to-resize gestures and a pluggable layout store.

pub mod accessor;
pub mod column;
pub mod interaction;
pub mod persistence;
pub mod pipeline;
pub mod reconcile;
pub mod row;
pub mod state;
pub mod table;
pub mod value;

pub use column::Column;
pub use persistence::{MemoryBackend, StorageBackend, StorageError};
pub use pipeline::{Sort, SortDirection};
pub use reconcile::MIN_COLUMN_WIDTH;
pub use row::{Record, RowKey, TableRow};
pub use state::State;
pub use table::{ColumnStyle, Environment, TableOptions, TableState};
pub use value::Value;

/// Everything needed to build and drive a table.
pub mod prelude {
    pub use crate::accessor::Accessor;
    pub use crate::column::Column;
    pub use crate::interaction::{
        CaptureHandle, ColumnOrderChange, HeaderElement, HeaderRect, PointerCapture,
    };
    pub use crate::persistence::{MemoryBackend, StorageBackend};
    pub use crate::pipeline::{Sort, SortDirection};
    pub use crate::row::{Record, RowKey, TableRow};
    pub use crate::state::State;
    pub use crate::table::{
        ColumnStyle, Environment, ManualFilterChange, ManualSortChange, TableOptions, TableState,
    };
    pub use crate::value::Value;
}
