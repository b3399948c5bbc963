//! Columnar batches (`{column id: [value per row]}`) as sent to the remote
//! store for bulk adds and updates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One columnar request body. Columns are kept sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableData(BTreeMap<String, Vec<serde_json::Value>>);

impl TableData {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the values of one column.
    pub fn insert_column(&mut self, col_id: impl Into<String>, values: Vec<serde_json::Value>) {
        self.0.insert(col_id.into(), values);
    }

    /// Values of one column.
    pub fn column(&self, col_id: &str) -> Option<&[serde_json::Value]> {
        self.0.get(col_id).map(Vec::as_slice)
    }

    /// Column ids, sorted.
    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// All columns.
    pub fn columns(&self) -> &BTreeMap<String, Vec<serde_json::Value>> {
        &self.0
    }

    /// Number of rows, taken from the first column.
    pub fn row_count(&self) -> usize {
        self.0.values().next().map_or(0, Vec::len)
    }

    /// Check if the batch has no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Human-readable summary for logging, e.g. `2 rows, cols (Num, id)`.
    pub fn describe(&self) -> String {
        let cols: Vec<&str> = self.column_ids().collect();
        format!("{} rows, cols ({})", self.row_count(), cols.join(", "))
    }
}

impl From<BTreeMap<String, Vec<serde_json::Value>>> for TableData {
    fn from(columns: BTreeMap<String, Vec<serde_json::Value>>) -> Self {
        Self(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe() {
        let mut data = TableData::new();
        data.insert_column("id", vec![json!(1), json!(4)]);
        data.insert_column("Num", vec![json!(-5), json!(-1.5)]);
        assert_eq!(data.describe(), "2 rows, cols (Num, id)");
        assert_eq!(TableData::new().describe(), "0 rows, cols ()");
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut data = TableData::new();
        data.insert_column("Text_Field", vec![json!("Eggs"), json!("Beets")]);
        data.insert_column("Num", vec![json!(2), json!(2)]);
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({"Num": [2, 2], "Text_Field": ["Eggs", "Beets"]})
        );
    }
}
