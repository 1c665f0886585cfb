// Wed Jan 21 2026 - Alex

use crate::source::batch::Row;
use crate::source::error::SourceError;
use crate::source::key::PartitionKey;
use crate::source::traits::{KeyScan, RowReader};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

type RawRecord<'a> = HashMap<String, &'a RawValue>;

/// A file holding one JSON object per line.
///
/// Records are streamed; each line is split into raw field slices and only the
/// fields a caller asks for are decoded, so key scans never build full rows
/// and partition reads hold one partition in memory.
pub struct JsonLinesReader {
    path: PathBuf,
    uri: String,
}

impl JsonLinesReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let uri = path.display().to_string();
        Self { path, uri }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<BufReader<File>, SourceError> {
        File::open(&self.path)
            .map(BufReader::new)
            .map_err(|e| SourceError::io(&self.uri, e))
    }

    /// Visit every well-formed record. Returns the number of malformed lines,
    /// including lines that are not valid UTF-8.
    fn for_each_record<F>(&self, mut visit: F) -> Result<usize, SourceError>
    where
        F: FnMut(&RawRecord<'_>),
    {
        let mut reader = self.open()?;
        let mut line = Vec::new();
        let mut malformed = 0;
        let mut number = 0;

        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)
                .map_err(|e| SourceError::io(&self.uri, e))?;
            if read == 0 {
                break;
            }
            number += 1;

            let trimmed = trim_ascii(&line);
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_slice::<RawRecord<'_>>(trimmed) {
                Ok(record) => visit(&record),
                Err(e) => {
                    malformed += 1;
                    log::debug!("{}:{}: skipping malformed record: {}", self.uri, number, e);
                }
            }
        }

        Ok(malformed)
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn decode_key(record: &RawRecord<'_>, key_column: &str) -> Option<PartitionKey> {
    let raw = record.get(key_column)?;
    let value: Value = serde_json::from_str(raw.get()).ok()?;
    PartitionKey::from_value(&value)
}

fn decode_row(record: &RawRecord<'_>, columns: &[String]) -> Row {
    let decode = |raw: &RawValue| serde_json::from_str::<Value>(raw.get()).ok();

    if columns.is_empty() {
        record.iter()
            .filter_map(|(name, raw)| decode(*raw).map(|v| (name.clone(), v)))
            .collect()
    } else {
        columns.iter()
            .filter_map(|name| record.get(name).and_then(|raw| decode(*raw)).map(|v| (name.clone(), v)))
            .collect()
    }
}

impl RowReader for JsonLinesReader {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn scan_keys(&self, key_column: &str) -> Result<KeyScan, SourceError> {
        let mut scan = KeyScan::default();
        let mut unkeyed = 0;

        let malformed = self.for_each_record(|record| match decode_key(record, key_column) {
            Some(key) => {
                scan.keys.insert(key);
            }
            None => unkeyed += 1,
        })?;

        scan.skipped_records = malformed + unkeyed;
        Ok(scan)
    }

    fn read_partition(
        &self,
        key_column: &str,
        key: &PartitionKey,
        columns: &[String],
    ) -> Result<Vec<Row>, SourceError> {
        let mut rows = Vec::new();

        self.for_each_record(|record| {
            if decode_key(record, key_column).as_ref() == Some(key) {
                rows.push(decode_row(record, columns));
            }
        })?;

        Ok(rows)
    }

    fn read_grouped(
        &self,
        key_column: &str,
        columns: &[String],
    ) -> Result<BTreeMap<PartitionKey, Vec<Row>>, SourceError> {
        let mut groups: BTreeMap<PartitionKey, Vec<Row>> = BTreeMap::new();

        self.for_each_record(|record| {
            if let Some(key) = decode_key(record, key_column) {
                groups.entry(key).or_default().push(decode_row(record, columns));
            }
        })?;

        Ok(groups)
    }
}
