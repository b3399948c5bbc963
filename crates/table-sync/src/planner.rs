//! Record mutation planner.
//!
//! Turns row-oriented records into the columnar batches sent to the store.
//! The `plan_*` functions are pure; the async functions send what they plan,
//! one request per batch, in order.

use json_types::{to_wire, TableData};
use std::collections::{BTreeMap, BTreeSet};
use sync_core::{chunks, CellValue, Error, Record, Result, RowId};
use table_store::{Filters, RemoteTableStore};
use tracing::info;

/// A record to add or update: column id -> value.
pub type RecordDict = BTreeMap<String, CellValue>;

/// Build the batches for adding `records`.
///
/// Each chunk gets the union of the columns of its records; a record
/// lacking one of them sends null for it.
pub fn plan_adds(records: &[RecordDict], chunk_size: Option<usize>) -> Vec<TableData> {
    if records.is_empty() {
        return Vec::new();
    }

    chunks(records.iter(), chunk_size)
        .map(|chunk| {
            let columns: BTreeSet<&String> = chunk.iter().flat_map(|rec| rec.keys()).collect();
            let mut data = TableData::new();
            for col_id in columns {
                let values = chunk
                    .iter()
                    .map(|rec| rec.get(col_id).map_or(serde_json::Value::Null, to_wire))
                    .collect();
                data.insert_column(col_id.clone(), values);
            }
            data
        })
        .collect()
}

/// Build the batches for updating `records`.
///
/// Records are grouped by their exact set of columns, groups ordered by
/// that set. More than one group is an error unless `group_if_needed` is
/// set. Every record must carry a non-null `id`. All batches are validated
/// before any is returned.
pub fn plan_updates(
    records: &[RecordDict],
    group_if_needed: bool,
    chunk_size: Option<usize>,
) -> Result<Vec<TableData>> {
    let mut groups: BTreeMap<Vec<&str>, Vec<&RecordDict>> = BTreeMap::new();
    for rec in records {
        let columns = rec.keys().map(String::as_str).collect();
        groups.entry(columns).or_default().push(rec);
    }
    if groups.len() > 1 && !group_if_needed {
        return Err(Error::validation(
            "update_records needs group_if_needed for varied sets of columns",
        ));
    }

    let mut batches = Vec::new();
    for (columns, group) in groups {
        for chunk in chunks(group, chunk_size) {
            let has_ids = columns.contains(&"id")
                && chunk
                    .iter()
                    .all(|rec| rec.get("id").is_some_and(|id| !id.is_null()));
            if !has_ids {
                return Err(Error::validation(
                    "update_records requires 'id' key in each record",
                ));
            }

            let mut data = TableData::new();
            for col_id in &columns {
                let values = chunk
                    .iter()
                    .map(|rec| rec.get(*col_id).map_or(serde_json::Value::Null, to_wire))
                    .collect();
                data.insert_column(*col_id, values);
            }
            batches.push(data);
        }
    }
    Ok(batches)
}

/// Fetch the rows of a table, optionally only those matching `filters`.
pub async fn fetch_table<S: RemoteTableStore + ?Sized>(
    store: &S,
    table_id: &str,
    filters: Option<&Filters>,
) -> Result<Vec<Record>> {
    let rows = store.fetch(table_id, filters).await?;
    info!("fetch_table {} returned {} rows", table_id, rows.len());
    Ok(rows)
}

/// Add records, returning the ids assigned to them in order.
///
/// Empty input sends nothing.
pub async fn add_records<S: RemoteTableStore + ?Sized>(
    store: &S,
    table_id: &str,
    records: &[RecordDict],
    chunk_size: Option<usize>,
) -> Result<Vec<RowId>> {
    let mut row_ids = Vec::new();
    for data in plan_adds(records, chunk_size) {
        info!("add_records {} {}", table_id, data.describe());
        row_ids.extend(store.bulk_add(table_id, &data).await?);
    }
    Ok(row_ids)
}

/// Update existing records; each must carry the `id` of its row.
///
/// See [`plan_updates`] for grouping and validation. Nothing is sent when
/// validation fails.
pub async fn update_records<S: RemoteTableStore + ?Sized>(
    store: &S,
    table_id: &str,
    records: &[RecordDict],
    group_if_needed: bool,
    chunk_size: Option<usize>,
) -> Result<()> {
    for data in plan_updates(records, group_if_needed, chunk_size)? {
        info!("update_records {} {}", table_id, data.describe());
        store.bulk_update(table_id, &data).await?;
    }
    Ok(())
}

/// Delete rows by id, one request per chunk.
pub async fn delete_records<S: RemoteTableStore + ?Sized>(
    store: &S,
    table_id: &str,
    row_ids: &[RowId],
    chunk_size: Option<usize>,
) -> Result<()> {
    if row_ids.is_empty() {
        return Ok(());
    }
    for chunk in chunks(row_ids.iter().copied(), chunk_size) {
        info!("delete_records {} {} records", table_id, chunk.len());
        store.bulk_delete(table_id, &chunk).await?;
    }
    Ok(())
}
