// Wed Jan 21 2026 - Alex

use crate::source::data_source::DataSource;
use crate::source::error::SourceError;
use crate::source::key::PartitionKey;
use crate::source::traits::KeyScan;
use std::collections::BTreeSet;

/// Discovers which partition keys a source holds.
#[derive(Debug, Clone)]
pub struct PartitionLocator {
    key_column: String,
}

impl PartitionLocator {
    pub fn new(key_column: &str) -> Self {
        Self {
            key_column: key_column.to_string(),
        }
    }

    /// Keys present in `source`. An unreadable source reports no keys.
    pub fn locate(&self, source: &DataSource) -> BTreeSet<PartitionKey> {
        match self.scan(source) {
            Ok(scan) => scan.keys,
            Err(e) => {
                log::warn!("Skipping source {}: {}", source.uri(), e);
                BTreeSet::new()
            }
        }
    }

    pub fn scan(&self, source: &DataSource) -> Result<KeyScan, SourceError> {
        let scan = source.reader().scan_keys(&self.key_column)?;

        if scan.skipped_records > 0 {
            log::debug!(
                "{}: {} records without a usable '{}' value",
                source.uri(), scan.skipped_records, self.key_column
            );
        }
        log::debug!("{}: located {} partitions", source.uri(), scan.keys.len());

        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_locate_in_memory() {
        let rows = vec![json!({"k": "A"}), json!({"k": "B"}), json!({"k": "A"})]
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        let source = DataSource::in_memory("mem://a", rows, vec![]);
        let keys = PartitionLocator::new("k").locate(&source);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec![PartitionKey::from("A"), PartitionKey::from("B")]);
    }

    #[test]
    fn test_unreadable_source_yields_no_keys() {
        let source = DataSource::json_lines("/no/such/file.jsonl", vec![]);
        let locator = PartitionLocator::new("k");
        assert!(locator.locate(&source).is_empty());
        assert!(locator.scan(&source).is_err());
    }
}
