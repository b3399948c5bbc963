//! Reverse conversion: CSV string → CellValue.

use sync_core::timestamp::{parse_iso_date, parse_iso_datetime};
use sync_core::{CellValue, ColumnType};
use thiserror::Error;

/// A CSV string with the type of the column it belongs to.
#[derive(Debug, Clone)]
pub struct CsvStringWithType<'a> {
    /// The CSV string value
    pub value: &'a str,
    /// The declared column type
    pub col_type: ColumnType,
}

impl<'a> CsvStringWithType<'a> {
    /// Create a new CSV string with type.
    pub fn new(value: &'a str, col_type: ColumnType) -> Self {
        Self { value, col_type }
    }

    /// Convert to CellValue based on the column type.
    pub fn to_cell_value(&self) -> Result<CellValue, CsvParseError> {
        csv_string_to_cell_value(self.value, self.col_type)
    }
}

/// Error type for CSV parsing failures.
#[derive(Debug, Clone, Error)]
#[error("Failed to parse '{value}' as {expected_type}: {message}")]
pub struct CsvParseError {
    pub message: String,
    pub value: String,
    pub expected_type: ColumnType,
}

impl CsvParseError {
    fn new(value: &str, expected_type: ColumnType, message: &str) -> Self {
        Self {
            message: message.to_string(),
            value: value.to_string(),
            expected_type,
        }
    }
}

/// Parse a CSV string value according to the column type.
///
/// An empty cell is null for every type.
pub fn csv_string_to_cell_value(
    value: &str,
    col_type: ColumnType,
) -> Result<CellValue, CsvParseError> {
    if value.is_empty() {
        return Ok(CellValue::Null);
    }

    match col_type {
        ColumnType::Text => Ok(CellValue::Text(value.to_string())),

        ColumnType::Date => parse_iso_date(value)
            .map(CellValue::Date)
            .or_else(|| parse_iso_datetime(value))
            .ok_or_else(|| CsvParseError::new(value, col_type, "expected YYYY-MM-DD")),

        ColumnType::DateTime => parse_iso_datetime(value)
            .or_else(|| parse_iso_date(value).map(CellValue::Date))
            .ok_or_else(|| CsvParseError::new(value, col_type, "expected ISO 8601 date/time")),

        ColumnType::Numeric => {
            let trimmed = value.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(CellValue::Int(i));
            }
            trimmed
                .parse::<f64>()
                .map(CellValue::Float)
                .map_err(|_| CsvParseError::new(value, col_type, "Invalid number"))
        }
    }
}

/// Parse a CSV string value for an untyped column.
pub fn csv_string_to_cell_value_inferred(value: &str) -> CellValue {
    if value.is_empty() {
        return CellValue::Null;
    }

    // Try integer
    if let Ok(i) = value.parse::<i64>() {
        return CellValue::Int(i);
    }

    // Try float
    if let Ok(f) = value.parse::<f64>() {
        return CellValue::Float(f);
    }

    // Try boolean
    match value.to_lowercase().as_str() {
        "true" => return CellValue::Bool(true),
        "false" => return CellValue::Bool(false),
        _ => {}
    }

    // Default to string
    CellValue::Text(value.to_string())
}
