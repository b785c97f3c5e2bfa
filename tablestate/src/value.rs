//! Value enum for dynamic cell values

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

/// A dynamic value read from a row, or held as a filter.
///
/// # Type Mapping
///
/// | JSON / source type | Rust Variant |
/// |--------------------|--------------|
/// | null, missing | `Null` |
/// | boolean | `Bool` |
/// | integer | `Int` |
/// | other number | `Float` |
/// | string | `String` |
/// | timestamp | `DateTime` |
/// | array | `List` |
/// | object | `Map` |
///
/// # Example
///
/// ```
/// use tablestate::value::Value;
///
/// let name = Value::from("Contoso");
/// let revenue = Value::from(1_000_000i64);
/// let missing = Value::from(None::<String>);
/// assert!(missing.is_null());
/// assert_eq!(revenue.to_text(), "1000000");
/// assert_eq!(name.to_text(), "Contoso");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Null/empty value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(String),
    /// Date and time with timezone.
    DateTime(DateTime<Utc>),
    /// Ordered collection.
    List(Vec<Value>),
    /// Nested record.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the numeric value for `Int` and `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a child by path segment.
    ///
    /// Maps are indexed by key, lists by a decimal index. Everything else
    /// has no children.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(segment),
            Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Text form used for filtering, sorting fallbacks and plain display.
    ///
    /// Null renders empty, integral floats drop their fraction, lists join
    /// with `,`, maps render as JSON and datetimes as RFC 3339.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_text(*f),
            Value::String(s) => s.clone(),
            Value::DateTime(dt) => dt.to_rfc3339(),
            Value::List(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Whether a filter slot holding this value should constrain rows.
    ///
    /// Null is inactive, strings need a non-blank body, lists need an item,
    /// maps need at least one active field. Other scalars are always active.
    pub fn is_filter_active(&self) -> bool {
        match self {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => map.values().any(Value::is_filter_active),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::DateTime(_) => true,
        }
    }
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        return "NaN".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return (f as i64).to_string();
    }
    f.to_string()
}

/// Total ordering used by automatic sorting.
///
/// Values are ranked by kind first: null, then numbers, then datetimes, then
/// everything else. Numbers compare exactly across `Int` and `Float` with NaN
/// after every other number, datetimes by instant, the rest by lowercased
/// text.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => l.cmp(r),
        (Value::Float(l), Value::Float(r)) => compare_floats(*l, *r),
        (Value::Int(l), Value::Float(r)) => compare_int_float(*l, *r),
        (Value::Float(l), Value::Int(r)) => compare_int_float(*r, *l).reverse(),
        (Value::DateTime(l), Value::DateTime(r)) => l.cmp(r),
        _ => match sort_rank(left).cmp(&sort_rank(right)) {
            Ordering::Equal if sort_rank(left) == TEXT_RANK => {
                left.to_text().to_lowercase().cmp(&right.to_text().to_lowercase())
            }
            ordering => ordering,
        },
    }
}

const TEXT_RANK: u8 = 3;

fn sort_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Int(_) | Value::Float(_) => 1,
        Value::DateTime(_) => 2,
        _ => TEXT_RANK,
    }
}

fn compare_floats(left: f64, right: f64) -> Ordering {
    match (left.is_nan(), right.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
    }
}

// 2^63, the first float above every i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn compare_int_float(int: i64, float: f64) -> Ordering {
    if float.is_nan() || float >= I64_BOUND {
        return Ordering::Less;
    }
    if float < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => compare_floats(whole, float),
        ordering => ordering,
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}
