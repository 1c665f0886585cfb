// Wed Jan 21 2026 - Alex

use crate::source::batch::Row;
use crate::source::jsonl::JsonLinesReader;
use crate::source::memory::InMemoryReader;
use crate::source::traits::RowReader;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A backing container of rows plus the columns needed downstream.
///
/// Cheap to clone; the reader and the projection are shared.
#[derive(Clone)]
pub struct DataSource {
    columns: Arc<[String]>,
    reader: Arc<dyn RowReader>,
}

impl DataSource {
    pub fn new(reader: Arc<dyn RowReader>, columns: Vec<String>) -> Self {
        Self {
            columns: columns.into(),
            reader,
        }
    }

    pub fn json_lines<P: AsRef<Path>>(path: P, columns: Vec<String>) -> Self {
        Self::new(Arc::new(JsonLinesReader::new(path)), columns)
    }

    pub fn in_memory(uri: &str, rows: Vec<Row>, columns: Vec<String>) -> Self {
        Self::new(Arc::new(InMemoryReader::new(uri, rows)), columns)
    }

    pub fn uri(&self) -> &str {
        self.reader.uri()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn reader(&self) -> &dyn RowReader {
        self.reader.as_ref()
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("uri", &self.uri())
            .field("columns", &self.columns)
            .finish()
    }
}
