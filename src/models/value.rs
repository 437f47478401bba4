//! Dynamically typed column values.
//!
//! `Value` is the closed union over every scalar type the engine can read
//! from or bind into a statement. Keeping it a tagged enum (rather than an
//! open "any" type) keeps the materializer and the CRUD orchestration
//! exhaustive: adding a variant fails to compile until every consumer
//! handles it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A single column value.
///
/// `Decimal` carries the exact text representation reported by the
/// database so arbitrary-precision values never round-trip through a
/// float.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    BigInt(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Text value
    Text(String),
    /// Binary data (base64 encoded in JSON)
    Bytes(Vec<u8>),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Date and time, no timezone
    Timestamp(NaiveDateTime),
    /// Exact decimal, preserved as the database's text representation
    Decimal(String),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this value for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::BigInt(_) => "bigint",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Timestamp(_) => "timestamp",
            Self::Decimal(_) => "decimal",
        }
    }

    /// Boolean view. Integer 0/1 counts as a boolean because several
    /// databases surface BOOLEAN columns as integers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Int(v) if *v == 0 || *v == 1 => Some(*v != 0),
            Self::BigInt(v) if *v == 0 || *v == 1 => Some(*v != 0),
            _ => None,
        }
    }

    /// Integer view over both integer widths.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point view; integers widen losslessly enough for display
    /// and arithmetic use.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(f64::from(*v)),
            Self::BigInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Self::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Exact decimal text, e.g. "12345.6789".
    pub fn as_decimal(&self) -> Option<&str> {
        match self {
            Self::Decimal(v) => Some(v),
            _ => None,
        }
    }

    /// Render this value as JSON. Binary data becomes base64 text;
    /// non-finite floats fall back to their string form because JSON has
    /// no representation for them.
    pub fn to_json(&self) -> JsonValue {
        use base64::{Engine as _, engine::general_purpose::STANDARD};

        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Int(v) => JsonValue::Number((*v).into()),
            Self::BigInt(v) => JsonValue::Number((*v).into()),
            Self::Float(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string())),
            Self::Double(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string())),
            Self::Text(v) => JsonValue::String(v.clone()),
            Self::Bytes(v) => JsonValue::String(STANDARD.encode(v)),
            Self::Date(v) => JsonValue::String(v.format("%Y-%m-%d").to_string()),
            Self::Time(v) => JsonValue::String(v.format("%H:%M:%S%.f").to_string()),
            Self::Timestamp(v) => JsonValue::String(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Self::Decimal(v) => JsonValue::String(v.clone()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Result shape of a plain `query`: a one-column result yields bare
/// scalars, a wider result yields fixed-length tuples in column order.
/// Callers selecting a single column get values without record wrapping.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRows {
    /// One value per row (single-column result).
    Scalars(Vec<Value>),
    /// One tuple per row; tuple length equals the column count.
    Tuples(Vec<Vec<Value>>),
}

impl QueryRows {
    pub fn len(&self) -> usize {
        match self {
            Self::Scalars(rows) => rows.len(),
            Self::Tuples(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_scalars(self) -> Option<Vec<Value>> {
        match self {
            Self::Scalars(rows) => Some(rows),
            Self::Tuples(_) => None,
        }
    }

    pub fn into_tuples(self) -> Option<Vec<Vec<Value>>> {
        match self {
            Self::Scalars(_) => None,
            Self::Tuples(rows) => Some(rows),
        }
    }
}
