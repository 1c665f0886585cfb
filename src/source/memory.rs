// Wed Jan 21 2026 - Alex

use crate::source::batch::{project, Row};
use crate::source::error::SourceError;
use crate::source::key::PartitionKey;
use crate::source::traits::{KeyScan, RowReader};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Rows held in memory, for embedding callers and tests.
pub struct InMemoryReader {
    uri: String,
    rows: Arc<Vec<Row>>,
}

impl InMemoryReader {
    pub fn new(uri: &str, rows: Vec<Row>) -> Self {
        Self {
            uri: uri.to_string(),
            rows: Arc::new(rows),
        }
    }
}

impl RowReader for InMemoryReader {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn scan_keys(&self, key_column: &str) -> Result<KeyScan, SourceError> {
        let mut scan = KeyScan::default();
        for row in self.rows.iter() {
            match row.get(key_column).and_then(PartitionKey::from_value) {
                Some(key) => {
                    scan.keys.insert(key);
                }
                None => scan.skipped_records += 1,
            }
        }
        Ok(scan)
    }

    fn read_partition(
        &self,
        key_column: &str,
        key: &PartitionKey,
        columns: &[String],
    ) -> Result<Vec<Row>, SourceError> {
        Ok(self.rows.iter()
            .filter(|row| row.get(key_column).map_or(false, |v| key.matches(v)))
            .map(|row| project(row.clone(), columns))
            .collect())
    }

    fn read_grouped(
        &self,
        key_column: &str,
        columns: &[String],
    ) -> Result<BTreeMap<PartitionKey, Vec<Row>>, SourceError> {
        let mut groups: BTreeMap<PartitionKey, Vec<Row>> = BTreeMap::new();
        for row in self.rows.iter() {
            if let Some(key) = row.get(key_column).and_then(PartitionKey::from_value) {
                groups.entry(key).or_default().push(project(row.clone(), columns));
            }
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reader() -> InMemoryReader {
        let rows = vec![
            json!({"k": 1, "x": 1.0, "extra": "a"}),
            json!({"k": 2, "x": 2.0}),
            json!({"k": 1, "x": 3.0}),
            json!({"x": 4.0}),
        ];
        InMemoryReader::new(
            "mem://test",
            rows.into_iter().map(|v| v.as_object().cloned().unwrap()).collect(),
        )
    }

    #[test]
    fn test_scan_keys_counts_unkeyed_rows() {
        let scan = reader().scan_keys("k").unwrap();
        assert_eq!(scan.keys.len(), 2);
        assert_eq!(scan.skipped_records, 1);
    }

    #[test]
    fn test_read_partition_projects() {
        let rows = reader()
            .read_partition("k", &PartitionKey::Int(1), &["x".to_string()])
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 1 && r.contains_key("x")));
    }

    #[test]
    fn test_read_grouped() {
        let groups = reader().read_grouped("k", &[]).unwrap();
        assert_eq!(groups[&PartitionKey::Int(1)].len(), 2);
        assert_eq!(groups[&PartitionKey::Int(2)].len(), 1);
    }
}
