//! In-memory table store.
//!
//! Behaves like a remote document: it assigns ascending row ids, rejects
//! unknown tables, columns and row ids, and keeps cells in wire form. Every
//! call is recorded so tests can assert on the exact requests made.

use crate::traits::{Filters, RemoteTableStore};
use json_types::{from_json, to_wire, TableData};
use serde_json::Value;
use std::collections::BTreeMap;
use sync_core::{CellValue, Error, Record, Result, RowId};
use tokio::sync::Mutex;

/// One request received by a [`MemoryTableStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Fetch {
        table_id: String,
        filters: Option<Filters>,
    },
    BulkAdd {
        table_id: String,
        data: TableData,
    },
    BulkUpdate {
        table_id: String,
        data: TableData,
    },
    BulkDelete {
        table_id: String,
        row_ids: Vec<RowId>,
    },
}

impl StoreCall {
    /// Returns true for calls that change the table.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Fetch { .. })
    }
}

#[derive(Debug, Default)]
struct MemoryTable {
    columns: Vec<String>,
    rows: BTreeMap<RowId, BTreeMap<String, Value>>,
    next_id: RowId,
}

impl MemoryTable {
    fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn check_column(&self, col_id: &str) -> Result<()> {
        if self.columns.iter().any(|c| c == col_id) {
            Ok(())
        } else {
            Err(bad_request(format!("Invalid column \"{col_id}\"")))
        }
    }

    fn check_row(&self, row_id: RowId) -> Result<()> {
        if self.rows.contains_key(&row_id) {
            Ok(())
        } else {
            Err(bad_request(format!("Invalid row id {row_id}")))
        }
    }

    fn insert(&mut self, fields: BTreeMap<String, Value>) -> RowId {
        let row_id = self.next_id;
        self.next_id += 1;
        self.rows.insert(row_id, fields);
        row_id
    }

    fn to_record(&self, row_id: RowId, cells: &BTreeMap<String, Value>) -> Record {
        let mut record = Record::new(row_id);
        for col_id in &self.columns {
            let value = cells.get(col_id).map_or(CellValue::Null, from_json);
            record.fields.insert(col_id.clone(), value);
        }
        record
    }

    fn matches(&self, row_id: RowId, cells: &BTreeMap<String, Value>, filters: &Filters) -> bool {
        filters.iter().all(|(col_id, wanted)| {
            let wanted = from_json(&to_wire(wanted));
            let actual = if col_id == "id" {
                CellValue::Int(row_id)
            } else {
                cells.get(col_id).map_or(CellValue::Null, from_json)
            };
            actual == wanted
        })
    }
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, MemoryTable>,
    calls: Vec<StoreCall>,
    writes: usize,
    fail_on_write: Option<usize>,
}

impl State {
    fn table(&self, table_id: &str) -> Result<&MemoryTable> {
        self.tables.get(table_id).ok_or_else(|| not_found(table_id))
    }

    fn table_mut(&mut self, table_id: &str) -> Result<&mut MemoryTable> {
        self.tables.get_mut(table_id).ok_or_else(|| not_found(table_id))
    }

    /// Count a write request and fail it if a failure was scheduled for it.
    fn begin_write(&mut self, call: StoreCall) -> Result<()> {
        self.calls.push(call);
        let index = self.writes;
        self.writes += 1;
        if self.fail_on_write == Some(index) {
            return Err(Error::RemoteRequest {
                status: 500,
                message: format!("Injected failure on write #{index}"),
            });
        }
        Ok(())
    }
}

/// Remote table store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    state: Mutex<State>,
}

impl MemoryTableStore {
    /// Create a store with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty table with the given columns.
    pub fn with_table<I, C>(mut self, table_id: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.state
            .get_mut()
            .tables
            .insert(table_id.to_string(), MemoryTable::new(columns));
        self
    }

    /// Seed a row. Unknown tables are created on the fly with the row's
    /// columns; unknown columns are added to the table.
    pub fn with_row<I, K, V>(mut self, table_id: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        let table = self
            .state
            .get_mut()
            .tables
            .entry(table_id.to_string())
            .or_insert_with(|| MemoryTable::new(Vec::new()));
        let mut cells = BTreeMap::new();
        for (col_id, value) in fields {
            let col_id = col_id.into();
            if !table.columns.contains(&col_id) {
                table.columns.push(col_id.clone());
            }
            cells.insert(col_id, to_wire(&value.into()));
        }
        table.insert(cells);
        self
    }

    /// Make the `n`th write request (zero-based, counted from creation)
    /// fail with a server error without applying it.
    pub fn failing_on_write(mut self, n: usize) -> Self {
        self.state.get_mut().fail_on_write = Some(n);
        self
    }

    /// All requests received so far, in order.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    /// Only the requests that change a table.
    pub async fn write_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .await
            .into_iter()
            .filter(StoreCall::is_write)
            .collect()
    }

    /// Forget recorded requests.
    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Current rows of a table, without recording a request.
    pub async fn rows(&self, table_id: &str) -> Result<Vec<Record>> {
        let state = self.state.lock().await;
        let table = state.table(table_id)?;
        Ok(table
            .rows
            .iter()
            .map(|(row_id, cells)| table.to_record(*row_id, cells))
            .collect())
    }
}

#[async_trait::async_trait]
impl RemoteTableStore for MemoryTableStore {
    async fn fetch(&self, table_id: &str, filters: Option<&Filters>) -> Result<Vec<Record>> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Fetch {
            table_id: table_id.to_string(),
            filters: filters.cloned(),
        });

        let table = state.table(table_id)?;
        if let Some(filters) = filters {
            for col_id in filters.keys().filter(|c| c.as_str() != "id") {
                table.check_column(col_id)?;
            }
        }

        Ok(table
            .rows
            .iter()
            .filter(|(row_id, cells)| {
                filters.map_or(true, |f| table.matches(**row_id, cells, f))
            })
            .map(|(row_id, cells)| table.to_record(*row_id, cells))
            .collect())
    }

    async fn bulk_add(&self, table_id: &str, data: &TableData) -> Result<Vec<RowId>> {
        let mut state = self.state.lock().await;
        state.begin_write(StoreCall::BulkAdd {
            table_id: table_id.to_string(),
            data: data.clone(),
        })?;

        let table = state.table_mut(table_id)?;
        let rows = split_rows(data)?;
        for col_id in data.column_ids() {
            table.check_column(col_id)?;
        }
        Ok(rows.into_iter().map(|cells| table.insert(cells)).collect())
    }

    async fn bulk_update(&self, table_id: &str, data: &TableData) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin_write(StoreCall::BulkUpdate {
            table_id: table_id.to_string(),
            data: data.clone(),
        })?;

        let table = state.table_mut(table_id)?;
        let mut rows = split_rows(data)?;
        for col_id in data.column_ids().filter(|c| *c != "id") {
            table.check_column(col_id)?;
        }

        let mut updates = Vec::with_capacity(rows.len());
        for cells in &mut rows {
            let row_id = cells
                .remove("id")
                .and_then(|id| id.as_i64())
                .ok_or_else(|| bad_request("Missing or invalid row id".to_string()))?;
            table.check_row(row_id)?;
            updates.push((row_id, std::mem::take(cells)));
        }

        for (row_id, cells) in updates {
            if let Some(row) = table.rows.get_mut(&row_id) {
                row.extend(cells);
            }
        }
        Ok(())
    }

    async fn bulk_delete(&self, table_id: &str, row_ids: &[RowId]) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin_write(StoreCall::BulkDelete {
            table_id: table_id.to_string(),
            row_ids: row_ids.to_vec(),
        })?;

        let table = state.table_mut(table_id)?;
        for row_id in row_ids {
            table.check_row(*row_id)?;
        }
        for row_id in row_ids {
            table.rows.remove(row_id);
        }
        Ok(())
    }
}

/// Turn columnar data into one cell map per row.
fn split_rows(data: &TableData) -> Result<Vec<BTreeMap<String, Value>>> {
    let row_count = data.row_count();
    let mut rows = vec![BTreeMap::new(); row_count];
    for (col_id, values) in data.columns() {
        if values.len() != row_count {
            return Err(bad_request(format!(
                "Column \"{col_id}\" has {} values, expected {row_count}",
                values.len()
            )));
        }
        for (row, value) in rows.iter_mut().zip(values) {
            row.insert(col_id.clone(), value.clone());
        }
    }
    Ok(rows)
}

fn not_found(table_id: &str) -> Error {
    Error::RemoteRequest {
        status: 404,
        message: format!("Table not found \"{table_id}\""),
    }
}

fn bad_request(message: String) -> Error {
    Error::RemoteRequest {
        status: 400,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fruit() -> MemoryTableStore {
        MemoryTableStore::new()
            .with_row("Fruit", [("Name", CellValue::from("Apple")), ("Num", 5.into())])
            .with_row("Fruit", [("Name", CellValue::from("Orange")), ("Num", 8.into())])
    }

    #[test]
    fn test_seeded_rows_get_ascending_ids() {
        let store = fruit();
        let rows = tokio_test::block_on(store.rows("Fruit")).unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(rows[1].get("Name"), Some(&CellValue::from("Orange")));
    }

    #[test]
    fn test_fetch_filters_compare_wire_values() {
        let store = fruit();
        let filters = Filters::from([("Num".to_string(), CellValue::Float(8.0))]);
        let rows = tokio_test::block_on(store.fetch("Fruit", Some(&filters))).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 2);
    }

    #[test]
    fn test_add_fills_missing_columns_with_null() {
        let store = fruit();
        let mut data = TableData::new();
        data.insert_column("Name", vec![json!("Melon")]);
        let ids = tokio_test::block_on(store.bulk_add("Fruit", &data)).unwrap();
        assert_eq!(ids, vec![3]);
        let rows = tokio_test::block_on(store.rows("Fruit")).unwrap();
        assert_eq!(rows[2].get("Num"), Some(&CellValue::Null));
    }

    #[test]
    fn test_update_rejects_unknown_row_without_applying() {
        let store = fruit();
        let mut data = TableData::new();
        data.insert_column("id", vec![json!(1), json!(9)]);
        data.insert_column("Num", vec![json!(0), json!(0)]);
        let err = tokio_test::block_on(store.bulk_update("Fruit", &data)).unwrap_err();
        assert!(matches!(err, Error::RemoteRequest { status: 400, .. }));
        let rows = tokio_test::block_on(store.rows("Fruit")).unwrap();
        assert_eq!(rows[0].get("Num"), Some(&CellValue::Int(5)));
    }

    #[test]
    fn test_unknown_table_and_column() {
        let store = fruit();
        let err = tokio_test::block_on(store.fetch("Unicorn", None)).unwrap_err();
        assert!(matches!(err, Error::RemoteRequest { status: 404, .. }));

        let mut data = TableData::new();
        data.insert_column("Color", vec![json!("RED")]);
        let err = tokio_test::block_on(store.bulk_add("Fruit", &data)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Remote request failed with status 400: Invalid column \"Color\""
        );
    }

    #[test]
    fn test_injected_failure_is_recorded_and_not_applied() {
        let store = fruit().failing_on_write(0);
        let err = tokio_test::block_on(store.bulk_delete("Fruit", &[1])).unwrap_err();
        assert!(matches!(err, Error::RemoteRequest { status: 500, .. }));
        assert_eq!(tokio_test::block_on(store.rows("Fruit")).unwrap().len(), 2);
        assert_eq!(tokio_test::block_on(store.write_calls()).len(), 1);

        tokio_test::block_on(store.bulk_delete("Fruit", &[1])).unwrap();
        assert_eq!(tokio_test::block_on(store.rows("Fruit")).unwrap().len(), 1);
    }
}
