//! Field access by dotted path or callback.

use std::fmt;
use std::sync::Arc;

use crate::row::TableRow;
use crate::value::Value;

/// A dotted field path, split once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        let raw = path.into();
        let segments = raw.split('.').map(str::to_string).collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walk the path through `row`.
    ///
    /// The first segment is a row field; later segments index into maps and
    /// lists. Any missing or null step yields `Null`.
    pub fn resolve<R: TableRow>(&self, row: &R) -> Value {
        let Some((first, rest)) = self.segments.split_first() else {
            return Value::Null;
        };
        let Some(mut current) = row.field(first) else {
            return Value::Null;
        };
        for segment in rest {
            if current.is_null() {
                return Value::Null;
            }
            current = match current.child(segment) {
                Some(next) => next.clone(),
                None => return Value::Null,
            };
        }
        current
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// Function form of an accessor.
pub type AccessorFn<R> = Arc<dyn Fn(&R) -> Value + Send + Sync>;

/// How a column derives a value from a row.
pub enum Accessor<R> {
    Path(FieldPath),
    Function(AccessorFn<R>),
}

impl<R: TableRow> Accessor<R> {
    pub fn path(path: impl Into<FieldPath>) -> Self {
        Accessor::Path(path.into())
    }

    pub fn function(f: impl Fn(&R) -> Value + Send + Sync + 'static) -> Self {
        Accessor::Function(Arc::new(f))
    }

    pub fn resolve(&self, row: &R) -> Value {
        match self {
            Accessor::Path(path) => path.resolve(row),
            Accessor::Function(f) => f(row),
        }
    }
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        match self {
            Accessor::Path(path) => Accessor::Path(path.clone()),
            Accessor::Function(f) => Accessor::Function(Arc::clone(f)),
        }
    }
}

impl<R> fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Path(path) => f.debug_tuple("Path").field(&path.as_str()).finish(),
            Accessor::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl<R: TableRow> From<&str> for Accessor<R> {
    fn from(path: &str) -> Self {
        Accessor::path(path)
    }
}

impl<R: TableRow> From<String> for Accessor<R> {
    fn from(path: String) -> Self {
        Accessor::path(path)
    }
}
