// Tue Jan 27 2026 - Alex

use crate::runtime::{
    Handle, Placement, PlacementError, PlacementService, PlacementStrategy, RunContext, TaskError,
};
use crate::source::{Batch, DataSource, PartitionKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Handles for every key of one staged source.
pub type StagedBatches = BTreeMap<PartitionKey, Handle<Batch>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StagingError {
    #[error("source unreadable: {0}")]
    Source(String),
    #[error("store rejected batch: {0}")]
    Store(String),
    #[error("staging task panicked: {0}")]
    Panicked(String),
    #[error("cancelled")]
    Cancelled,
}

/// Reads each source once into the object store, one staging task per
/// reserved host slot.
pub struct Stager {
    ctx: RunContext,
    placement: Arc<dyn PlacementService>,
}

impl Stager {
    pub fn new(ctx: RunContext, placement: Arc<dyn PlacementService>) -> Self {
        Self { ctx, placement }
    }

    /// One entry per source, in input order. Only a placement service that
    /// cannot offer a single slot fails the whole call.
    pub fn stage_all(&self, sources: &[DataSource]) -> Result<Vec<Result<StagedBatches, StagingError>>, PlacementError> {
        let mut outcomes = Vec::with_capacity(sources.len());
        let mut remaining = sources;
        let mut wave_index = 0;

        while !remaining.is_empty() {
            let capacity = self.placement.capacity(PlacementStrategy::Spread);
            if capacity == 0 {
                return Err(PlacementError::NoCapacity);
            }

            let wave = remaining.len().min(capacity);
            let reservation = self.placement.reserve(wave, PlacementStrategy::Spread)?;
            log::info!("Staging wave {}: {} sources on {} hosts", wave_index, wave, reservation.len());

            let guards = reservation.into_guards(&self.placement);
            let futures: Vec<_> = remaining[..wave].iter()
                .zip(guards)
                .map(|(source, guard)| {
                    let host = guard.host();
                    let source = source.clone();
                    let ctx = self.ctx.clone();
                    self.ctx.scheduler.submit(format!("stage:{}", source.uri()), Placement::Host(host), move |_| {
                        let _slot = guard;
                        if ctx.cancel.is_cancelled() {
                            return Err(StagingError::Cancelled);
                        }
                        stage_source(&ctx, &source)
                    })
                })
                .collect();

            for (source, result) in remaining[..wave].iter().zip(self.ctx.scheduler.await_all(futures)) {
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(TaskError::Panicked { message, .. }) => Err(StagingError::Panicked(message)),
                    Err(TaskError::Abandoned(task)) => Err(StagingError::Panicked(format!("task '{}' abandoned", task))),
                };
                match &outcome {
                    Ok(batches) => log::debug!("Staged {}: {} batches", source.uri(), batches.len()),
                    Err(e) => log::warn!("Staging {} failed: {}", source.uri(), e),
                }
                outcomes.push(outcome);
            }

            remaining = &remaining[wave..];
            wave_index += 1;
        }

        Ok(outcomes)
    }
}

fn stage_source(ctx: &RunContext, source: &DataSource) -> Result<StagedBatches, StagingError> {
    let grouped = source.reader()
        .read_grouped(&ctx.config.key_column, source.columns())
        .map_err(|e| StagingError::Source(e.to_string()))?;

    let mut staged = BTreeMap::new();
    for (key, rows) in grouped {
        let batch = Batch::new(source.uri(), key.clone(), rows);
        match ctx.store.put(&batch) {
            Ok(handle) => {
                staged.insert(key, handle);
            }
            Err(e) => {
                for handle in staged.values() {
                    ctx.store.remove(handle);
                }
                return Err(StagingError::Store(e.to_string()));
            }
        }
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::runtime::{HostId, LocalPlacement, ObjectStore, TaskScheduler};
    use crate::source::Row;
    use serde_json::json;

    fn rows(keys: &[i64]) -> Vec<Row> {
        keys.iter()
            .map(|k| json!({"k": k, "v": k * 10}).as_object().cloned().unwrap())
            .collect()
    }

    fn context() -> RunContext {
        RunContext::new(
            RunConfig::new().with_key_column("k"),
            TaskScheduler::new(4).unwrap(),
            ObjectStore::new(),
        )
    }

    #[test]
    fn test_stage_groups_by_key() {
        let ctx = context();
        let placement = Arc::new(LocalPlacement::new(2, 1));
        let stager = Stager::new(ctx.clone(), placement.clone());

        let source = DataSource::in_memory("mem://a", rows(&[1, 2, 1]), vec![]);
        let outcomes = stager.stage_all(&[source]).unwrap();

        let staged = outcomes[0].as_ref().unwrap();
        assert_eq!(staged.len(), 2);
        let batch = ctx.store.get(&staged[&PartitionKey::Int(1)]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(placement.active_slots(), 0);
    }

    #[test]
    fn test_one_dispatch_per_host_per_wave() {
        let ctx = context();
        let placement = Arc::new(LocalPlacement::new(4, 1));
        let stager = Stager::new(ctx.clone(), placement.clone());

        let sources: Vec<_> = (0..4)
            .map(|i| DataSource::in_memory(&format!("mem://{}", i), rows(&[i]), vec![]))
            .collect();
        let outcomes = stager.stage_all(&sources).unwrap();
        assert!(outcomes.iter().all(|o| o.is_ok()));

        let dispatches = ctx.scheduler.stats().host_dispatches;
        assert_eq!(dispatches.len(), 4);
        assert!(dispatches.values().all(|&n| n == 1));
    }

    #[test]
    fn test_more_sources_than_hosts_run_in_waves() {
        let ctx = context();
        let placement = Arc::new(LocalPlacement::new(2, 1));
        let stager = Stager::new(ctx.clone(), placement.clone());

        let sources: Vec<_> = (0..5)
            .map(|i| DataSource::in_memory(&format!("mem://{}", i), rows(&[i]), vec![]))
            .collect();
        let outcomes = stager.stage_all(&sources).unwrap();
        assert_eq!(outcomes.len(), 5);

        let dispatches = ctx.scheduler.stats().host_dispatches;
        assert_eq!(dispatches.get(&HostId(0)), Some(&3));
        assert_eq!(dispatches.get(&HostId(1)), Some(&2));
        assert_eq!(placement.active_slots(), 0);
    }

    #[test]
    fn test_failing_source_does_not_stop_others() {
        let ctx = context();
        let placement = Arc::new(LocalPlacement::new(2, 1));
        let stager = Stager::new(ctx, placement.clone());

        let sources = vec![
            DataSource::json_lines("/no/such/file.jsonl", vec![]),
            DataSource::in_memory("mem://ok", rows(&[1]), vec![]),
        ];
        let outcomes = stager.stage_all(&sources).unwrap();
        assert!(matches!(outcomes[0], Err(StagingError::Source(_))));
        assert!(outcomes[1].is_ok());
        assert_eq!(placement.active_slots(), 0);
    }

    #[test]
    fn test_zero_capacity_is_fatal() {
        let stager = Stager::new(context(), Arc::new(LocalPlacement::new(0, 1)));
        let source = DataSource::in_memory("mem://a", rows(&[1]), vec![]);
        assert_eq!(stager.stage_all(&[source]).unwrap_err(), PlacementError::NoCapacity);
    }
}
