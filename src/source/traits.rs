// Wed Jan 21 2026 - Alex

use crate::source::batch::Row;
use crate::source::error::SourceError;
use crate::source::key::PartitionKey;
use std::collections::{BTreeMap, BTreeSet};

/// Result of scanning only the key column of a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyScan {
    pub keys: BTreeSet<PartitionKey>,
    /// Records that could not be decoded or carried no usable key.
    pub skipped_records: usize,
}

pub trait RowReader: Send + Sync {
    fn uri(&self) -> &str;

    /// Decode the key column of every record and nothing else.
    fn scan_keys(&self, key_column: &str) -> Result<KeyScan, SourceError>;

    /// Rows whose key equals `key`, projected to `columns`.
    fn read_partition(
        &self,
        key_column: &str,
        key: &PartitionKey,
        columns: &[String],
    ) -> Result<Vec<Row>, SourceError>;

    /// The whole source in one pass, grouped by key.
    fn read_grouped(
        &self,
        key_column: &str,
        columns: &[String],
    ) -> Result<BTreeMap<PartitionKey, Vec<Row>>, SourceError>;
}
