// Wed Jan 21 2026 - Alex

use crate::orchestration::outcome::EmptyReason;
use crate::runtime::{Handle, ObjectStore, StoreError};
use crate::source::batch::Batch;
use crate::source::data_source::DataSource;
use crate::source::key::PartitionKey;
use thiserror::Error;

/// Where a pipeline gets its batch from.
#[derive(Debug, Clone)]
pub enum LoaderStrategy {
    /// Read matching rows straight from the source.
    OnDemand,
    /// Materialize a batch staged earlier in the object store.
    Staged(Handle<Batch>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadedBatch {
    Rows(Batch),
    Empty(EmptyReason),
}

/// Failures the loader does not turn into an empty batch.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Staged batch unavailable: {0}")]
    Store(#[from] StoreError),
    #[error("Staged batch belongs to {found_source}/{found_key}, expected {expected_source}/{expected_key}")]
    Mismatch {
        expected_source: String,
        expected_key: PartitionKey,
        found_source: String,
        found_key: PartitionKey,
    },
}

#[derive(Debug, Clone)]
pub struct BatchLoader {
    key_column: String,
    store: ObjectStore,
}

impl BatchLoader {
    pub fn new(key_column: &str, store: ObjectStore) -> Self {
        Self {
            key_column: key_column.to_string(),
            store,
        }
    }

    pub fn load(
        &self,
        source: &DataSource,
        key: &PartitionKey,
        strategy: &LoaderStrategy,
    ) -> Result<LoadedBatch, LoadError> {
        let batch = match strategy {
            LoaderStrategy::OnDemand => {
                match source.reader().read_partition(&self.key_column, key, source.columns()) {
                    Ok(rows) => Batch::new(source.uri(), key.clone(), rows),
                    Err(e) => {
                        log::warn!("{}/{}: source unreadable: {}", source.uri(), key, e);
                        return Ok(LoadedBatch::Empty(EmptyReason::SourceUnreadable {
                            message: e.to_string(),
                        }));
                    }
                }
            }
            LoaderStrategy::Staged(handle) => {
                let batch = self.store.get(handle)?;
                if batch.source() != source.uri() || batch.key() != key {
                    return Err(LoadError::Mismatch {
                        expected_source: source.uri().to_string(),
                        expected_key: key.clone(),
                        found_source: batch.source().to_string(),
                        found_key: batch.key().clone(),
                    });
                }
                batch
            }
        };

        if batch.is_empty() {
            log::debug!("{}/{}: no rows", source.uri(), key);
            return Ok(LoadedBatch::Empty(EmptyReason::KeyAbsent));
        }

        log::debug!("{}/{}: loaded {} rows", source.uri(), key, batch.len());
        Ok(LoadedBatch::Rows(batch))
    }
}
