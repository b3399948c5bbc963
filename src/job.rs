//! Sync job files.
//!
//! A job describes how external records map onto a remote table:
//!
//! ```yaml
//! table: Table1
//! key_columns:
//!   - remote: Text_Field
//!     source: name
//!     type: Text
//! other_columns:
//!   - remote: Num
//!     source: num
//!     type: Numeric
//!   - remote: Date
//!     source: date
//!     type: Date
//! filters:
//!   ColorRef: 1
//! chunk_size: 500
//! ```

use crate::source::SourceRow;
use json_types::from_json_with_type;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use sync_core::{ColumnSpec, ColumnType};
use table_store::{Filters, RemoteTableStore};
use table_sync::{sync_table, SyncOptions, SyncSummary};
use thiserror::Error;

/// Errors from loading a sync job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Error reading job file
    #[error("Failed to read job file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The job parsed but cannot be run
    #[error("Invalid sync job: {0}")]
    Invalid(String),
}

/// One synced column: remote column id, source field name, optional type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub remote: String,
    pub source: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub col_type: Option<ColumnType>,
}

impl ColumnMapping {
    pub fn to_spec(&self) -> ColumnSpec<SourceRow> {
        let spec = ColumnSpec::new(self.remote.as_str(), self.source.as_str());
        match self.col_type {
            Some(col_type) => spec.with_type(col_type),
            None => spec,
        }
    }
}

/// A sync job loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncJob {
    /// Remote table id
    pub table: String,

    /// Columns identifying a row
    pub key_columns: Vec<ColumnMapping>,

    /// Columns kept in sync on matched rows
    #[serde(default)]
    pub other_columns: Vec<ColumnMapping>,

    /// Column -> required value
    #[serde(default)]
    pub filters: BTreeMap<String, serde_json::Value>,

    /// Maximum rows per request
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

impl SyncJob {
    /// Load a job from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a job from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, JobError> {
        let job: SyncJob = serde_yaml::from_str(yaml)?;
        job.validate()?;
        Ok(job)
    }

    fn validate(&self) -> Result<(), JobError> {
        if self.table.trim().is_empty() {
            return Err(JobError::Invalid("table must not be empty".to_string()));
        }
        if self.key_columns.is_empty() {
            return Err(JobError::Invalid(
                "at least one key column is required".to_string(),
            ));
        }
        if self.chunk_size == Some(0) {
            return Err(JobError::Invalid("chunk_size must be positive".to_string()));
        }
        Ok(())
    }

    fn columns(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.key_columns.iter().chain(&self.other_columns)
    }

    /// Declared type per source field, for parsing source files.
    pub fn source_types(&self) -> HashMap<String, ColumnType> {
        self.columns()
            .filter_map(|c| c.col_type.map(|t| (c.source.clone(), t)))
            .collect()
    }

    /// Filters as cell values. Strings filtering a `Date` or `DateTime`
    /// column are parsed as dates.
    pub fn filters(&self) -> Filters {
        self.filters
            .iter()
            .map(|(col_id, value)| {
                let col_type = self
                    .columns()
                    .find(|c| &c.remote == col_id || &c.source == col_id)
                    .and_then(|c| c.col_type);
                (col_id.clone(), from_json_with_type(value, col_type))
            })
            .collect()
    }

    pub fn key_specs(&self) -> Vec<ColumnSpec<SourceRow>> {
        self.key_columns.iter().map(ColumnMapping::to_spec).collect()
    }

    pub fn other_specs(&self) -> Vec<ColumnSpec<SourceRow>> {
        self.other_columns.iter().map(ColumnMapping::to_spec).collect()
    }

    /// Sync `rows` into the job's table. `chunk_size` overrides the job's.
    pub async fn run<S: RemoteTableStore + ?Sized>(
        &self,
        store: &S,
        rows: &[SourceRow],
        chunk_size: Option<usize>,
    ) -> sync_core::Result<SyncSummary> {
        let options = SyncOptions {
            baseline: None,
            chunk_size: chunk_size.or(self.chunk_size),
            filters: (!self.filters.is_empty()).then(|| self.filters()),
        };
        sync_table(
            store,
            &self.table,
            rows,
            &self.key_specs(),
            &self.other_specs(),
            options,
        )
        .await
    }
}
