//! Row records and row identity.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Trait for records that can be displayed as table rows.
///
/// The engine only ever reads rows. A row exposes its top-level fields by
/// name; nested data is reached through [`Value::Map`] and [`Value::List`].
///
/// # Example
///
/// ```
/// use tablestate::row::TableRow;
/// use tablestate::value::Value;
///
/// #[derive(Clone)]
/// struct User {
///     name: String,
///     age: i64,
/// }
///
/// impl TableRow for User {
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "name" => Some(Value::from(self.name.as_str())),
///             "age" => Some(Value::from(self.age)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait TableRow: Clone + Send + Sync + 'static {
    /// Value of a top-level field, or `None` if the row has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

/// A dynamic row backed by a field map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }
}

impl TableRow for Record {
    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Record {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        }
    }
}

impl TableRow for serde_json::Value {
    fn field(&self, name: &str) -> Option<Value> {
        self.as_object()
            .and_then(|object| object.get(name))
            .map(|v| Value::from(v.clone()))
    }
}

/// Row identity function.
pub type RowKeyFn<R> = Arc<dyn Fn(&R, usize) -> String + Send + Sync>;

/// How the view layer identifies a row.
pub enum RowKey<R> {
    /// Read a field; falls back to the row index when the field is null.
    Field(String),
    Function(RowKeyFn<R>),
}

impl<R: TableRow> RowKey<R> {
    pub fn field(name: impl Into<String>) -> Self {
        RowKey::Field(name.into())
    }

    pub fn function(f: impl Fn(&R, usize) -> String + Send + Sync + 'static) -> Self {
        RowKey::Function(Arc::new(f))
    }

    pub fn resolve(&self, row: &R, index: usize) -> String {
        match self {
            RowKey::Field(name) => match row.field(name) {
                Some(value) if !value.is_null() => value.to_text(),
                _ => index.to_string(),
            },
            RowKey::Function(f) => f(row, index),
        }
    }
}

impl<R> Default for RowKey<R> {
    fn default() -> Self {
        RowKey::Field("id".into())
    }
}

impl<R> Clone for RowKey<R> {
    fn clone(&self) -> Self {
        match self {
            RowKey::Field(name) => RowKey::Field(name.clone()),
            RowKey::Function(f) => RowKey::Function(Arc::clone(f)),
        }
    }
}

impl<R> fmt::Debug for RowKey<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Field(name) => f.debug_tuple("Field").field(name).finish(),
            RowKey::Function(_) => f.write_str("Function(..)"),
        }
    }
}
