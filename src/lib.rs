//! grist-sync Library
//!
//! A library for keeping Grist document tables in sync with external data.
//!
//! # Features
//!
//! - Diff-and-reconcile sync: only changed columns of matched rows are
//!   updated, and only unmatched records are added
//! - Typed comparison: `Date` columns compare calendar dates, not timestamps
//! - Filtered syncs over a subset of a table
//! - Chunked requests and bounded retry on transient lock contention
//! - Dry-run mode that only reads
//!
//! # Crates
//!
//! - `sync_core` - cell values, column specs, coercion, batching, errors
//! - `json_types` / `csv_types` - value conversions
//! - `table_store` - the `RemoteTableStore` trait and an in-memory store
//! - `grist_client` - the HTTP store
//! - `table_sync` - mutation planner and table synchronizer
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the rows of a table as JSON lines
//! grist-sync fetch --doc <doc-id> --table Table1 --filter ColorRef=1
//!
//! # Sync a CSV file into a table as described by a job file
//! grist-sync sync --doc <doc-id> --job fruit.yaml --source fruit.csv
//!
//! # Delete rows
//! grist-sync delete --doc <doc-id> --table Table1 --ids 5,6
//! ```

use anyhow::Context;
use clap::Parser;
use std::num::NonZeroUsize;

pub mod job;
pub mod logging;
pub mod source;

pub use grist_client::{resolve_api_key, GristClient, GristConfig, RetryPolicy};
pub use json_types::{to_wire, TableData};
pub use logging::init_logging;
pub use sync_core::{
    chunks, date_to_ts, dt_to_ts, from_wire_by_type, ts_to_date, ts_to_dt, CellValue,
    ColumnAccessor, ColumnSpec, ColumnType, Error, Record, Result, RowId, RowSource,
};
pub use table_store::{Filters, MemoryTableStore, RemoteTableStore};
pub use table_sync::{
    add_records, delete_records, fetch_table, sync_table, update_records, RecordDict,
    SyncOptions, SyncSummary,
};

#[derive(Parser, Clone, Debug)]
pub struct GristOpts {
    /// Grist server URL
    #[arg(long, default_value = grist_client::DEFAULT_SERVER, env = "GRIST_SERVER")]
    pub server: String,

    /// Document id (the part of the document URL after /doc/)
    #[arg(long = "doc", env = "GRIST_DOC_ID")]
    pub doc_id: String,

    /// API key; read from ~/.grist-api-key when not given
    #[arg(long, env = "GRIST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Dry run mode - only read, log the requests that would change data
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum rows per request
    #[arg(long)]
    pub chunk_size: Option<NonZeroUsize>,
}

impl GristOpts {
    /// Chunk size override as passed to the sync operations.
    pub fn chunk_size(&self) -> Option<usize> {
        self.chunk_size.map(NonZeroUsize::get)
    }
}

impl From<&GristOpts> for GristConfig {
    fn from(opts: &GristOpts) -> Self {
        let config = GristConfig::new(opts.doc_id.clone())
            .with_server(opts.server.clone())
            .with_dry_run(opts.dry_run);
        match &opts.api_key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        }
    }
}

/// Parse a `column=value` filter argument. The value's type is inferred.
pub fn parse_filter(arg: &str) -> anyhow::Result<(String, CellValue)> {
    let (col_id, value) = arg
        .split_once('=')
        .with_context(|| format!("Invalid filter '{arg}': expected COLUMN=VALUE"))?;
    let col_id = col_id.trim();
    if col_id.is_empty() {
        anyhow::bail!("Invalid filter '{arg}': empty column name");
    }
    Ok((
        col_id.to_string(),
        csv_types::csv_string_to_cell_value_inferred(value),
    ))
}
