//! Value and record representations.
//!
//! `CellValue` is the single in-memory value type used on both sides of a
//! sync: cells decoded from the remote table and fields read from external
//! records. Equality and hashing are numeric-aware, so `Int(5)`,
//! `Float(5.0)` and `Decimal(5)` are the same key and the same value.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// Row identifier assigned by the remote store.
pub type RowId = i64;

/// A single cell value.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Missing or empty value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Arbitrary-precision decimal
    Decimal(Decimal),

    /// String value
    Text(String),

    /// Calendar date
    Date(NaiveDate),

    /// Date/time without an offset, treated as UTC
    DateTime(NaiveDateTime),

    /// Date/time carrying its own offset
    ZonedDateTime(DateTime<FixedOffset>),

    /// Structured remote value (reference lists, error cells, ...)
    Json(serde_json::Value),
}

/// Hashable projection of a numeric value. Integral floats and decimals
/// collapse onto `Int` so they compare equal to the matching integer.
#[derive(PartialEq, Eq, Hash)]
enum NumericKey {
    Int(i64),
    Float(u64),
}

fn float_key(f: f64) -> NumericKey {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        NumericKey::Int(f as i64)
    } else {
        NumericKey::Float(f.to_bits())
    }
}

impl CellValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value is an integer, float or decimal.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_) | Self::Decimal(_))
    }

    /// Numeric value as an f64 (decimals round to the nearest double).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    fn numeric_key(&self) -> Option<NumericKey> {
        match self {
            Self::Int(i) => Some(NumericKey::Int(*i)),
            Self::Float(f) => Some(float_key(*f)),
            Self::Decimal(d) => {
                if d.fract().is_zero() {
                    if let Some(i) = d.to_i64() {
                        return Some(NumericKey::Int(i));
                    }
                }
                d.to_f64().map(float_key)
            }
            _ => None,
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.numeric_key(), other.numeric_key()) {
            return a == b;
        }
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::ZonedDateTime(a), Self::ZonedDateTime(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            _ => false,
        }
    }
}

// NaN equals itself here, unlike f64. Keys need a total equivalence.
impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(key) = self.numeric_key() {
            0u8.hash(state);
            key.hash(state);
            return;
        }
        match self {
            Self::Null => 1u8.hash(state),
            Self::Bool(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            Self::Text(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            Self::Date(d) => {
                4u8.hash(state);
                d.hash(state);
            }
            Self::DateTime(dt) => {
                5u8.hash(state);
                dt.hash(state);
            }
            Self::ZonedDateTime(dt) => {
                6u8.hash(state);
                dt.hash(state);
            }
            Self::Json(v) => {
                7u8.hash(state);
                v.to_string().hash(state);
            }
            Self::Int(_) | Self::Float(_) | Self::Decimal(_) => {}
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for CellValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::ZonedDateTime(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::ZonedDateTime(value.fixed_offset())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A row fetched from the remote table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Row id assigned by the remote store
    pub id: RowId,

    /// Column values (column id -> value), excluding `id`
    pub fields: BTreeMap<String, CellValue>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Add a field to the record.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields.get(name)
    }
}

/// Named field access over a record.
///
/// Implemented for remote [`Record`]s and the common external shapes.
/// Returning `None` means the record has no such field.
pub trait RowSource {
    fn field(&self, name: &str) -> Option<CellValue>;
}

impl RowSource for Record {
    fn field(&self, name: &str) -> Option<CellValue> {
        if name == "id" {
            return Some(CellValue::Int(self.id));
        }
        self.fields.get(name).cloned()
    }
}

impl RowSource for BTreeMap<String, CellValue> {
    fn field(&self, name: &str) -> Option<CellValue> {
        self.get(name).cloned()
    }
}

impl RowSource for HashMap<String, CellValue> {
    fn field(&self, name: &str) -> Option<CellValue> {
        self.get(name).cloned()
    }
}

/// Positional rows: the field name is the zero-based column index.
impl RowSource for Vec<CellValue> {
    fn field(&self, name: &str) -> Option<CellValue> {
        name.parse::<usize>().ok().and_then(|i| self.get(i).cloned())
    }
}
