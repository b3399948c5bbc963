//! Table synchronizer: diff external records against a remote table and
//! reconcile it with the minimal set of updates and adds.
//!
//! Rows are matched on the tuple of coerced key column values. Matched rows
//! get an update holding only the columns whose coerced values differ;
//! unmatched records are added with every synced column. Remote rows are
//! never deleted, and columns outside the mapping are never touched.

use crate::planner::{add_records, fetch_table, update_records, RecordDict};
use std::collections::HashMap;
use sync_core::{CellValue, ColumnSpec, Record, Result, RowId, RowSource};
use table_store::{Filters, RemoteTableStore};
use tracing::{debug, info};

/// Optional inputs of [`sync_table`].
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Remote rows to diff against. When `None` or empty they are fetched,
    /// using `filters`.
    pub baseline: Option<Vec<Record>>,

    /// Maximum rows per request
    pub chunk_size: Option<usize>,

    /// Restrict the sync to rows with these values.
    ///
    /// The filter narrows the fetched baseline, and external records whose
    /// key column (matched by external field name) has a different coerced
    /// value are skipped.
    pub filters: Option<Filters>,
}

impl SyncOptions {
    pub fn with_baseline(mut self, baseline: Vec<Record>) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }
}

/// Changes computed by [`plan_sync`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    /// Distinct keys among the baseline rows
    pub baseline_rows: usize,
    /// External records considered
    pub data_count: usize,
    /// External records skipped by the filters
    pub filtered_out: usize,
    /// `{remote column: new value, ..., "id": row id}` per changed row
    pub updates: Vec<RecordDict>,
    /// `{remote column: value}` with every synced column, per new row
    pub adds: Vec<RecordDict>,
}

/// Outcome of [`sync_table`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Distinct keys among the baseline rows
    pub baseline_rows: usize,
    /// External records considered
    pub data_count: usize,
    /// External records skipped by the filters
    pub filtered_out: usize,
    /// Rows updated
    pub updates: usize,
    /// Rows added
    pub adds: usize,
    /// Ids assigned to the added rows; empty in dry-run mode
    pub added_ids: Vec<RowId>,
}

/// Compute the updates and adds that bring `baseline` in line with
/// `new_data`, without sending anything.
///
/// When several baseline rows share a key, the last one wins.
pub fn plan_sync<R: RowSource>(
    baseline: &[Record],
    new_data: &[R],
    key_cols: &[ColumnSpec<R>],
    other_cols: &[ColumnSpec<R>],
    filters: Option<&Filters>,
) -> Result<SyncPlan> {
    let mut remote_rows: HashMap<Vec<CellValue>, &Record> = HashMap::new();
    for row in baseline {
        let key = key_cols
            .iter()
            .map(|cs| cs.remote_value(row))
            .collect::<Result<Vec<_>>>()?;
        remote_rows.insert(key, row);
    }

    let mut plan = SyncPlan {
        baseline_rows: remote_rows.len(),
        ..SyncPlan::default()
    };

    for record in new_data {
        let key = key_cols
            .iter()
            .map(|cs| cs.external_value(record))
            .collect::<Result<Vec<_>>>()?;

        if let Some(filters) = filters {
            if is_filtered_out(key_cols, &key, filters) {
                plan.filtered_out += 1;
                continue;
            }
        }
        plan.data_count += 1;

        match remote_rows.get(&key) {
            Some(row) => {
                let mut update = RecordDict::new();
                let mut changes = Vec::new();
                for cs in other_cols {
                    let old = cs.remote_value(row)?;
                    let new = cs.external_value(record)?;
                    if old != new {
                        let col_id = cs.remote_col_id()?;
                        changes.push((col_id, old));
                        update.insert(col_id.to_string(), new);
                    }
                }
                if !update.is_empty() {
                    debug!(
                        "syncing: #{} {:?} needs updates {:?} -> {:?}",
                        row.id, key, changes, update
                    );
                    update.insert("id".to_string(), CellValue::Int(row.id));
                    plan.updates.push(update);
                }
            }
            None => {
                debug!("syncing: {:?} not in remote table", key);
                let mut add = RecordDict::new();
                for cs in key_cols.iter().chain(other_cols) {
                    add.insert(cs.remote_col_id()?.to_string(), cs.external_value(record)?);
                }
                plan.adds.push(add);
            }
        }
    }

    Ok(plan)
}

/// A record is filtered out when a key column read by external field name
/// has a filter on that name and its coerced value differs from it.
fn is_filtered_out<R>(key_cols: &[ColumnSpec<R>], key: &[CellValue], filters: &Filters) -> bool {
    key_cols.iter().zip(key).any(|(cs, value)| {
        cs.external
            .field_name()
            .and_then(|name| filters.get(name))
            .is_some_and(|wanted| wanted != value)
    })
}

/// Synchronize a remote table with `new_data`.
///
/// Fetches the baseline unless a non-empty one is supplied, computes the changes with
/// [`plan_sync`], then sends all updates followed by all adds. A failed
/// request aborts the sync; batches already sent stay applied.
pub async fn sync_table<S, R>(
    store: &S,
    table_id: &str,
    new_data: &[R],
    key_cols: &[ColumnSpec<R>],
    other_cols: &[ColumnSpec<R>],
    options: SyncOptions,
) -> Result<SyncSummary>
where
    S: RemoteTableStore + ?Sized,
    R: RowSource,
{
    let SyncOptions {
        baseline,
        chunk_size,
        filters,
    } = options;

    let baseline = match baseline.filter(|rows| !rows.is_empty()) {
        Some(rows) => rows,
        None => fetch_table(store, table_id, filters.as_ref()).await?,
    };

    let plan = plan_sync(&baseline, new_data, key_cols, other_cols, filters.as_ref())?;
    info!(
        "syncing {} ({}) with {} records ({} filtered out): {} updates, {} new",
        table_id,
        plan.baseline_rows,
        plan.data_count,
        plan.filtered_out,
        plan.updates.len(),
        plan.adds.len()
    );

    update_records(store, table_id, &plan.updates, true, chunk_size).await?;
    let added_ids = add_records(store, table_id, &plan.adds, chunk_size).await?;

    Ok(SyncSummary {
        baseline_rows: plan.baseline_rows,
        data_count: plan.data_count,
        filtered_out: plan.filtered_out,
        updates: plan.updates.len(),
        adds: plan.adds.len(),
        added_ids,
    })
}
