// Wed Jan 21 2026 - Alex

pub mod batch;
pub mod data_source;
pub mod error;
pub mod jsonl;
pub mod key;
pub mod loader;
pub mod locator;
pub mod memory;
pub mod traits;

pub use batch::{Batch, Row};
pub use data_source::DataSource;
pub use error::SourceError;
pub use jsonl::JsonLinesReader;
pub use key::PartitionKey;
pub use loader::{BatchLoader, LoadError, LoadedBatch, LoaderStrategy};
pub use locator::PartitionLocator;
pub use memory::InMemoryReader;
pub use traits::{KeyScan, RowReader};
