// Mon Jan 26 2026 - Alex

use crate::orchestration::outcome::PipelineResult;
use crate::source::PartitionKey;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Gathers pipeline results in any arrival order and hands them back sorted
/// by source, then key.
#[derive(Default)]
pub struct ResultCollector {
    results: RwLock<BTreeMap<(String, PartitionKey), PipelineResult>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&self, result: PipelineResult) {
        let id = (result.source.clone(), result.key.clone());
        let mut results = self.results.write();
        if results.contains_key(&id) {
            log::warn!("Duplicate result for {}/{}; keeping the first", id.0, id.1);
            return;
        }
        results.insert(id, result);
    }

    pub fn collect_all<I: IntoIterator<Item = PipelineResult>>(&self, results: I) {
        for result in results {
            self.collect(result);
        }
    }

    pub fn contains(&self, source: &str, key: &PartitionKey) -> bool {
        self.results.read().contains_key(&(source.to_string(), key.clone()))
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }

    pub fn into_sorted(self) -> Vec<PipelineResult> {
        self.results.into_inner().into_values().collect()
    }
}
