//! RemoteTableStore trait definition.

use json_types::TableData;
use std::collections::BTreeMap;
use sync_core::{CellValue, Record, Result, RowId};

/// Equality filters on fetch: column id -> required value.
///
/// A row matches when every listed column equals its value.
pub type Filters = BTreeMap<String, CellValue>;

/// Trait for reading and writing rows of a remote table.
///
/// Batches are columnar ([`TableData`]) and already normalized to wire
/// values. Each call is one request; splitting into chunks is the
/// caller's job.
///
/// # Usage Pattern
///
/// Callers use generics for static dispatch:
///
/// ```ignore
/// pub async fn sync_table<S: RemoteTableStore + ?Sized, R: RowSource>(
///     store: &S,
///     table_id: &str,
///     ...
/// ) -> Result<SyncSummary> {
///     let rows = store.fetch(table_id, None).await?;
/// }
/// ```
#[async_trait::async_trait]
pub trait RemoteTableStore: Send + Sync {
    /// Fetch all rows of a table, or only those matching `filters`.
    ///
    /// Rows come back in id order with untyped cell values.
    async fn fetch(&self, table_id: &str, filters: Option<&Filters>) -> Result<Vec<Record>>;

    /// Add rows. Returns the ids assigned to them, in input order.
    ///
    /// An implementation that does not send anything (dry run) returns an
    /// empty list.
    async fn bulk_add(&self, table_id: &str, data: &TableData) -> Result<Vec<RowId>>;

    /// Update rows. `data` must contain an `id` column naming the rows.
    async fn bulk_update(&self, table_id: &str, data: &TableData) -> Result<()>;

    /// Remove rows by id.
    async fn bulk_delete(&self, table_id: &str, row_ids: &[RowId]) -> Result<()>;
}
