//! Table row representation
//!
//! This module provides the typed cell values stored in a table and the
//! validated row that groups them in schema order.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use chrono::NaiveDateTime;
use serde_json::{Map, Value as JsonValue};

use super::interval::DateInterval;
use crate::utils::truncate;

/// Storage representation backing a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// UTF-8 text
    Text,

    /// 64-bit signed integer
    Int64,

    /// 64-bit floating point
    Float64,

    /// Timezone-naive timestamp
    Timestamp,

    /// Closed timestamp interval
    Interval,
}

impl StorageKind {
    /// Get a short name for the storage kind
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Text => "text",
            StorageKind::Int64 => "int64",
            StorageKind::Float64 => "float64",
            StorageKind::Timestamp => "timestamp",
            StorageKind::Interval => "interval",
        }
    }
}

/// Value in a row
#[derive(Clone)]
pub enum Value {
    /// Text string (also backs single-character columns)
    Text(String),

    /// Integer (64-bit)
    Integer(i64),

    /// Floating point (64-bit)
    Real(f64),

    /// Timestamp without timezone
    Timestamp(NaiveDateTime),

    /// Date interval
    Interval(DateInterval),
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Text(v) => write!(f, "Text({:?})", truncate(v, 20)),
            Value::Integer(v) => write!(f, "Integer({})", v),
            Value::Real(v) => write!(f, "Real({})", v),
            Value::Timestamp(v) => write!(f, "Timestamp({})", v),
            Value::Interval(v) => write!(f, "Interval({})", v),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => {
                // NaN equals NaN so duplicate elimination stays well defined
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Interval(a), Value::Interval(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Get the storage kind of the value
    pub fn storage_kind(&self) -> StorageKind {
        match self {
            Value::Text(_) => StorageKind::Text,
            Value::Integer(_) => StorageKind::Int64,
            Value::Real(_) => StorageKind::Float64,
            Value::Timestamp(_) => StorageKind::Timestamp,
            Value::Interval(_) => StorageKind::Interval,
        }
    }

    /// Append a canonical, type-tagged encoding of the value to `out`
    ///
    /// Two values produce the same bytes exactly when they compare equal.
    pub fn encode_key(&self, out: &mut Vec<u8>) {
        match self {
            Value::Text(v) => {
                out.push(0);
                out.extend_from_slice(&(v.len() as u64).to_be_bytes());
                out.extend_from_slice(v.as_bytes());
            }
            Value::Integer(v) => {
                out.push(1);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Value::Real(v) => {
                out.push(2);
                let canonical = if v.is_nan() {
                    f64::NAN
                } else if *v == 0.0 {
                    0.0
                } else {
                    *v
                };
                out.extend_from_slice(&canonical.to_bits().to_be_bytes());
            }
            Value::Timestamp(v) => {
                out.push(3);
                encode_timestamp(v, out);
            }
            Value::Interval(v) => {
                out.push(4);
                encode_timestamp(&v.start(), out);
                encode_timestamp(&v.end(), out);
            }
        }
    }

    /// Convert the value to JSON
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Text(v) => JsonValue::String(v.clone()),
            Value::Integer(v) => JsonValue::from(*v),
            Value::Real(v) => JsonValue::from(*v),
            Value::Timestamp(v) => JsonValue::String(format_timestamp(v)),
            Value::Interval(v) => JsonValue::Array(vec![
                JsonValue::String(format_timestamp(&v.start())),
                JsonValue::String(format_timestamp(&v.end())),
            ]),
        }
    }
}

fn encode_timestamp(ts: &NaiveDateTime, out: &mut Vec<u8>) {
    let utc = ts.and_utc();
    out.extend_from_slice(&utc.timestamp().to_be_bytes());
    out.extend_from_slice(&utc.timestamp_subsec_nanos().to_be_bytes());
}

fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateInterval> for Value {
    fn from(v: DateInterval) -> Self {
        Value::Interval(v)
    }
}

/// A validated row, values kept in schema column order
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Debug for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_map()
            .entries(self.fields.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl Row {
    /// Create a row from `(column, value)` pairs
    ///
    /// Rows handed to a table are always produced by the schema validator;
    /// this constructor performs no type checks of its own.
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Row { fields }
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Number of columns in the row
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names, in schema order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Values, in schema order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    /// Iterate over `(column, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Value at column position `position`
    pub(crate) fn value_at(&self, position: usize) -> Option<&Value> {
        self.fields.get(position).map(|(_, value)| value)
    }

    /// Canonical key over the columns at `positions`
    pub(crate) fn key(&self, positions: &[usize]) -> Vec<u8> {
        let mut out = Vec::new();
        for &position in positions {
            if let Some(value) = self.value_at(position) {
                value.encode_key(&mut out);
            }
        }
        out
    }

    /// Convert the row to a JSON object
    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn sample_row() -> Row {
        Row::new(vec![
            ("name".to_string(), Value::from("Ann")),
            ("age".to_string(), Value::from(30i64)),
            ("score".to_string(), Value::from(1.5)),
        ])
    }

    #[test]
    fn test_row_access() {
        let row = sample_row();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get("age"), Some(&Value::Integer(30)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "age", "score"]);
        assert_eq!(row.value_at(0), Some(&Value::Text("Ann".to_string())));
    }

    #[test]
    fn test_row_to_json_preserves_order() {
        let json = sample_row().to_json();
        assert_eq!(json.to_string(), r#"{"name":"Ann","age":30,"score":1.5}"#);
    }

    #[test]
    fn test_real_equality() {
        assert_eq!(Value::Real(f64::NAN), Value::Real(f64::NAN));
        assert_eq!(Value::Real(-0.0), Value::Real(0.0));
        assert_ne!(Value::Real(1.0), Value::Integer(1));
    }

    #[test]
    fn test_key_matches_equality() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        Value::Real(-0.0).encode_key(&mut a);
        Value::Real(0.0).encode_key(&mut b);
        assert_eq!(a, b);

        // Length prefix keeps ("ab", "c") apart from ("a", "bc")
        let left = Row::new(vec![
            ("x".to_string(), Value::from("ab")),
            ("y".to_string(), Value::from("c")),
        ]);
        let right = Row::new(vec![
            ("x".to_string(), Value::from("a")),
            ("y".to_string(), Value::from("bc")),
        ]);
        assert_ne!(left.key(&[0, 1]), right.key(&[0, 1]));
        assert_eq!(left.key(&[]), right.key(&[]));
    }

    #[test]
    fn test_temporal_values_to_json() {
        let interval = DateInterval::new(ts(1), ts(2)).unwrap();
        assert_eq!(Value::Timestamp(ts(1)).to_json(), serde_json::json!("2024-03-01T08:30:00"));
        assert_eq!(
            Value::Interval(interval).to_json(),
            serde_json::json!(["2024-03-01T08:30:00", "2024-03-02T08:30:00"])
        );
        assert_eq!(Value::Interval(interval).storage_kind(), StorageKind::Interval);
    }

    #[test]
    fn test_value_debug_truncates() {
        let long = Value::Text("abcdefghijklmnopqrstuvwxyz".to_string());
        assert_eq!(format!("{:?}", long), "Text(\"abcdefghijklmnopqrst...\")");
    }
}
