// Wed Jan 21 2026 - Alex

use crate::source::key::PartitionKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record, restricted to the columns its source projects.
pub type Row = Map<String, Value>;

/// The rows of exactly one (source, key) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    source: String,
    key: PartitionKey,
    rows: Vec<Row>,
}

impl Batch {
    pub fn new(source: &str, key: PartitionKey, rows: Vec<Row>) -> Self {
        Self {
            source: source.to_string(),
            key,
            rows,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep only `columns` of `row`; an empty projection keeps everything.
pub fn project(mut row: Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row;
    }
    columns.iter()
        .filter_map(|c| row.remove(c).map(|v| (c.clone(), v)))
        .collect()
}
