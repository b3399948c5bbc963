//! Core types for grist-sync.
//!
//! This crate provides the foundational types shared by every other crate
//! in the workspace:
//!
//! - [`CellValue`] - Value of a single cell, remote or external
//! - [`Record`] - A row fetched from the remote table
//! - [`RowSource`] - Named field access over external records
//! - [`ColumnType`], [`ColumnAccessor`], [`ColumnSpec`] - Column mapping
//! - [`from_wire_by_type`] - Type coercion before comparison
//! - [`chunks`] - Order-preserving batching
//! - [`Error`] - Error type of the library crates
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── json-types     (CellValue <-> JSON wire values, columnar batches)
//!    ├─── csv-types      (CSV strings -> CellValue)
//!    ├─── table-store    (RemoteTableStore trait, in-memory store)
//!    ├─── grist-client   (HTTP RemoteTableStore)
//!    └─── table-sync     (mutation planner, table synchronizer)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{from_wire_by_type, CellValue, ColumnType};
//!
//! // The remote store keeps dates as timestamps of UTC midnight
//! let value = from_wire_by_type(CellValue::Int(1_561_507_200), Some(ColumnType::Date)).unwrap();
//! assert_eq!(value.as_date().unwrap().to_string(), "2019-06-26");
//! ```

pub mod batch;
pub mod coerce;
pub mod error;
pub mod timestamp;
pub mod types;
pub mod values;

pub use batch::{chunks, Chunks};
pub use coerce::from_wire_by_type;
pub use error::{Error, Result};
pub use timestamp::{date_to_ts, dt_to_ts, ts_to_date, ts_to_dt, zoned_dt_to_ts};
pub use types::{AccessorFn, ColumnAccessor, ColumnSpec, ColumnType};
pub use values::{CellValue, Record, RowId, RowSource};
