//! External record sources: CSV and JSON Lines files.
//!
//! Each row becomes a map of field name -> [`CellValue`]. CSV fields are
//! parsed with their declared type, and undeclared ones are text. JSON Lines
//! fields keep their JSON type unless a column type is declared.

use anyhow::{bail, Context, Result};
use csv_types::csv_string_to_cell_value;
use json_types::from_json_with_type;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use sync_core::{CellValue, ColumnType};
use tracing::debug;

/// One external record.
pub type SourceRow = BTreeMap<String, CellValue>;

/// Read a `.csv` or `.jsonl` (`.ndjson`) file.
pub fn read_source(path: &Path, types: &HashMap<String, ColumnType>) -> Result<Vec<SourceRow>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let file =
        File::open(path).with_context(|| format!("Failed to open source file {path:?}"))?;

    let rows = match extension.as_str() {
        "csv" => read_csv(file, types),
        "jsonl" | "ndjson" => read_jsonl(BufReader::new(file), types),
        _ => bail!("Unsupported source file {path:?}: expected .csv or .jsonl"),
    }
    .with_context(|| format!("Failed to read source file {path:?}"))?;

    debug!("Read {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Read CSV with a header row. Empty cells are null.
pub fn read_csv<R: Read>(reader: R, types: &HashMap<String, ColumnType>) -> Result<Vec<SourceRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let mut row = SourceRow::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            let col_type = types.get(header).copied().unwrap_or(ColumnType::Text);
            let value = csv_string_to_cell_value(value, col_type)
                .with_context(|| format!("Row {}, column '{header}'", index + 1))?;
            row.insert(header.to_string(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Read one JSON object per line. Blank lines are skipped.
pub fn read_jsonl<R: BufRead>(
    reader: R,
    types: &HashMap<String, ColumnType>,
) -> Result<Vec<SourceRow>> {
    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&line)
            .with_context(|| format!("Line {} is not a JSON object", index + 1))?;
        let row = object
            .iter()
            .map(|(name, value)| {
                let col_type = types.get(name).copied();
                (name.clone(), from_json_with_type(value, col_type))
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
