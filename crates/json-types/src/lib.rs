//! JSON wire conversions for sync-core types.
//!
//! This crate provides the conversions between sync-core's `CellValue` and
//! the JSON values exchanged with the remote store.
//!
//! # Modules
//!
//! - [`forward`] - CellValue → JSON wire value (the normalizer)
//! - [`reverse`] - JSON value → CellValue
//! - [`table_data`] - Columnar request batches
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use json_types::{from_json, to_wire};
//! use sync_core::CellValue;
//!
//! // Forward: dates go out as the timestamp of their UTC midnight
//! let d = CellValue::Date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
//! assert_eq!(to_wire(&d), serde_json::json!(86400.0));
//!
//! // Reverse: fetched cells come back untyped
//! assert_eq!(from_json(&serde_json::json!(86400)), CellValue::Int(86400));
//! ```

pub mod forward;
pub mod reverse;
pub mod table_data;

pub use forward::{record_to_json, to_wire, WireValue};
pub use reverse::{from_json, from_json_with_type, records_from_columns};
pub use table_data::TableData;
