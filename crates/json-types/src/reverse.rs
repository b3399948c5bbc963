//! Reverse conversion: JSON value → CellValue.
//!
//! Used for cells fetched from the remote store and for JSON-encoded
//! external records.

use serde_json::Value;
use sync_core::timestamp::{parse_iso_date, parse_iso_datetime};
use sync_core::{CellValue, ColumnType, Error, Record, Result, RowId};

/// Decode a JSON value without type information.
///
/// Integers that fit in an i64 stay integers, other numbers become
/// floats. Arrays and objects are kept whole as [`CellValue::Json`].
pub fn from_json(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map_or(CellValue::Null, CellValue::Float),
        },
        Value::String(s) => CellValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => CellValue::Json(value.clone()),
    }
}

/// Decode a JSON value, parsing strings in `Date` and `DateTime` columns.
///
/// Strings that do not parse are kept as text.
pub fn from_json_with_type(value: &Value, col_type: Option<ColumnType>) -> CellValue {
    match (col_type, value) {
        (Some(ColumnType::Date), Value::String(s)) => parse_iso_date(s)
            .map(CellValue::Date)
            .or_else(|| parse_iso_datetime(s))
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        (Some(ColumnType::DateTime), Value::String(s)) => parse_iso_datetime(s)
            .or_else(|| parse_iso_date(s).map(CellValue::Date))
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        _ => from_json(value),
    }
}

/// Convert columnar table data (`{"id": [...], "<col>": [...]}`) into rows.
///
/// Rows come out in the order of the `id` column.
pub fn records_from_columns(columns: Value) -> Result<Vec<Record>> {
    let Value::Object(mut columns) = columns else {
        return Err(Error::UnexpectedResponse(
            "table data must be a JSON object".to_string(),
        ));
    };

    let ids = match columns.remove("id") {
        Some(Value::Array(ids)) => ids
            .iter()
            .map(|id| {
                id.as_i64().ok_or_else(|| {
                    Error::UnexpectedResponse(format!("row id {id} is not an integer"))
                })
            })
            .collect::<Result<Vec<RowId>>>()?,
        Some(_) => {
            return Err(Error::UnexpectedResponse(
                "column 'id' must be an array".to_string(),
            ))
        }
        None => {
            return Err(Error::UnexpectedResponse(
                "table data has no 'id' column".to_string(),
            ))
        }
    };

    let mut records: Vec<Record> = ids.into_iter().map(Record::new).collect();
    for (col_id, values) in columns {
        let Value::Array(values) = values else {
            return Err(Error::UnexpectedResponse(format!(
                "column '{col_id}' must be an array"
            )));
        };
        if values.len() != records.len() {
            return Err(Error::UnexpectedResponse(format!(
                "column '{col_id}' has {} values for {} rows",
                values.len(),
                records.len()
            )));
        }
        for (record, value) in records.iter_mut().zip(values.iter()) {
            record.fields.insert(col_id.clone(), from_json(value));
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(from_json(&json!(null)), CellValue::Null);
        assert_eq!(from_json(&json!(5)), CellValue::Int(5));
        assert!(matches!(from_json(&json!(1.5)), CellValue::Float(f) if f == 1.5));
        assert_eq!(from_json(&json!("RED")), CellValue::Text("RED".to_string()));
        assert_eq!(from_json(&json!(["L", 1])), CellValue::Json(json!(["L", 1])));
    }

    #[test]
    fn test_from_json_with_type_parses_dates() {
        assert_eq!(
            from_json_with_type(&json!("2020-05-01"), Some(ColumnType::Date)),
            CellValue::Date(NaiveDate::from_ymd_opt(2020, 5, 1).unwrap())
        );
        assert!(matches!(
            from_json_with_type(&json!("2020-05-01T10:00:00Z"), Some(ColumnType::DateTime)),
            CellValue::ZonedDateTime(_)
        ));
        assert_eq!(
            from_json_with_type(&json!("soon"), Some(ColumnType::Date)),
            CellValue::Text("soon".to_string())
        );
        assert_eq!(
            from_json_with_type(&json!("2020-05-01"), Some(ColumnType::Text)),
            CellValue::Text("2020-05-01".to_string())
        );
    }

    #[test]
    fn test_records_from_columns() {
        let data = json!({
            "id": [1, 4],
            "Text_Field": ["Apple", "Strawberry"],
            "Num": [5, 1.5],
            "ColorRef_Value": ["RED", null],
        });
        let records = records_from_columns(data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 4);
        assert_eq!(records[0].get("Text_Field"), Some(&CellValue::from("Apple")));
        assert_eq!(records[1].get("Num"), Some(&CellValue::Float(1.5)));
        assert_eq!(records[1].get("ColorRef_Value"), Some(&CellValue::Null));
    }

    #[test]
    fn test_records_from_columns_rejects_bad_shapes() {
        assert!(matches!(
            records_from_columns(json!([1, 2])),
            Err(Error::UnexpectedResponse(_))
        ));
        assert!(matches!(
            records_from_columns(json!({"Num": [1]})),
            Err(Error::UnexpectedResponse(_))
        ));
        assert!(matches!(
            records_from_columns(json!({"id": [1, 2], "Num": [1]})),
            Err(Error::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_records_from_columns_empty_table() {
        let records = records_from_columns(json!({"id": [], "Num": []})).unwrap();
        assert!(records.is_empty());
    }
}
