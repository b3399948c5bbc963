//! Type coercion of raw values to a column's semantic type.
//!
//! Both remote cells and external fields go through [`from_wire_by_type`]
//! before they are compared, so a `Date` column compares calendar dates
//! rather than timestamps.

use crate::error::Result;
use crate::timestamp::ts_to_date;
use crate::types::ColumnType;
use crate::values::CellValue;

/// Convert `value` to the semantic type `col_type`.
///
/// - `Text` / untyped: null becomes `""`, anything else is unchanged.
/// - `Date`: date/times keep their date part; numbers are timestamps and
///   become the date they fall on.
/// - `DateTime`: numbers become a *date* via the same rule as `Date`. Full
///   date/times are not rebuilt from timestamps; existing data relies on it.
/// - `Numeric`: unchanged.
///
/// Null stays null for every type except `Text` / untyped.
pub fn from_wire_by_type(value: CellValue, col_type: Option<ColumnType>) -> Result<CellValue> {
    match col_type {
        None | Some(ColumnType::Text) => Ok(match value {
            CellValue::Null => CellValue::Text(String::new()),
            other => other,
        }),
        Some(ColumnType::Date) => match value {
            CellValue::DateTime(dt) => Ok(CellValue::Date(dt.date())),
            CellValue::ZonedDateTime(dt) => Ok(CellValue::Date(dt.date_naive())),
            other => numeric_to_date(other),
        },
        Some(ColumnType::DateTime) => numeric_to_date(value),
        Some(ColumnType::Numeric) => Ok(value),
    }
}

fn numeric_to_date(value: CellValue) -> Result<CellValue> {
    match value.as_f64() {
        Some(ts) => Ok(CellValue::Date(ts_to_date(ts)?)),
        None => Ok(value),
    }
}
