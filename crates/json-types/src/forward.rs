//! Forward conversion: CellValue → JSON wire value.
//!
//! This is the normalizer applied to every value sent to the remote store.

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;
use sync_core::{date_to_ts, CellValue, Record};

/// Wrapper for JSON wire values.
#[derive(Debug, Clone, PartialEq)]
pub struct WireValue(pub serde_json::Value);

impl WireValue {
    /// Get the inner JSON value.
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Get a reference to the inner JSON value.
    pub fn as_inner(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<&CellValue> for WireValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Null => WireValue(serde_json::Value::Null),
            CellValue::Bool(b) => WireValue(json!(*b)),
            CellValue::Int(i) => WireValue(json!(*i)),
            // NaN and infinities have no JSON form and go out as null
            CellValue::Float(f) => WireValue(json!(*f)),
            CellValue::Decimal(d) => {
                WireValue(d.to_f64().map_or(serde_json::Value::Null, |f| json!(f)))
            }
            CellValue::Text(s) => WireValue(json!(s)),

            // Dates travel as the timestamp of their UTC midnight
            CellValue::Date(d) => WireValue(json!(date_to_ts(*d))),

            // Date/times travel as ISO 8601 strings
            CellValue::DateTime(dt) => WireValue(json!(isoformat(dt))),
            CellValue::ZonedDateTime(dt) => {
                WireValue(json!(format!("{}{}", isoformat(&dt.naive_local()), dt.format("%:z"))))
            }

            CellValue::Json(v) => WireValue(v.clone()),
        }
    }
}

impl From<CellValue> for WireValue {
    fn from(value: CellValue) -> Self {
        WireValue::from(&value)
    }
}

/// Normalize a value into the remote store's wire representation.
pub fn to_wire(value: &CellValue) -> serde_json::Value {
    WireValue::from(value).into_inner()
}

/// `YYYY-MM-DDTHH:MM:SS`, with microseconds only when non-zero.
fn isoformat(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Render a fetched record as a JSON object, `id` included.
pub fn record_to_json(record: &Record) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert("id".to_string(), json!(record.id));
    for (name, value) in &record.fields {
        obj.insert(name.clone(), to_wire(value));
    }
    serde_json::Value::Object(obj)
}
