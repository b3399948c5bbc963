//! CSV type conversions for sync-core types.
//!
//! This crate converts CSV cell strings into sync-core's `CellValue`,
//! guided by the declared column type when there is one.
//!
//! # Example
//!
//! ```rust
//! use csv_types::{csv_string_to_cell_value, csv_string_to_cell_value_inferred};
//! use sync_core::{CellValue, ColumnType};
//!
//! let v = csv_string_to_cell_value("2020-05-01", ColumnType::Date).unwrap();
//! assert!(matches!(v, CellValue::Date(_)));
//!
//! assert_eq!(csv_string_to_cell_value_inferred("17"), CellValue::Int(17));
//! ```

pub mod reverse;

pub use reverse::{
    csv_string_to_cell_value, csv_string_to_cell_value_inferred, CsvParseError,
    CsvStringWithType,
};
