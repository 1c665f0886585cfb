// Tue Jan 27 2026 - Alex

use crate::config::{RunConfig, StagingMode};
use crate::error::OrchestratorError;
use crate::orchestration::collector::ResultCollector;
use crate::orchestration::outcome::{EmptyReason, PipelineFailure, PipelineResult};
use crate::orchestration::pipeline::PartitionPipeline;
use crate::orchestration::report::{RunReport, StagingFailure};
use crate::orchestration::staging::{Stager, StagingError};
use crate::runtime::{
    CancelFlag, LocalPlacement, ObjectStore, Placement, PlacementError, PlacementService, PlacementStrategy,
    RunContext, TaskError, TaskFuture, TaskScheduler,
};
use crate::source::{DataSource, LoaderStrategy, PartitionKey, PartitionLocator};
use crate::training::CandidateRoutine;
use crate::utils::{format_duration, measure_time};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Drives one run: locate keys, optionally stage, fan out one pipeline per
/// (source, key), and gather the report.
pub struct RunCoordinator {
    ctx: RunContext,
    routines: Arc<[Arc<dyn CandidateRoutine>]>,
    placement: Arc<dyn PlacementService>,
}

impl RunCoordinator {
    pub fn new(config: RunConfig, routines: Vec<Arc<dyn CandidateRoutine>>) -> Result<Self, OrchestratorError> {
        config.validate()?;
        if routines.is_empty() {
            return Err(OrchestratorError::NoRoutines);
        }

        let scheduler = TaskScheduler::new(config.worker_threads)?;
        let placement: Arc<dyn PlacementService> = Arc::new(LocalPlacement::new(
            config.placement.hosts,
            config.placement.slots_per_host,
        ));

        log::debug!(
            "Coordinator ready: {} workers, {} routines, {} mode",
            config.worker_threads, routines.len(), config.staging_mode
        );

        Ok(Self {
            ctx: RunContext::new(config, scheduler, ObjectStore::new()),
            routines: routines.into(),
            placement,
        })
    }

    pub fn with_placement(mut self, placement: Arc<dyn PlacementService>) -> Self {
        self.placement = placement;
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn config(&self) -> &RunConfig {
        &self.ctx.config
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.ctx.cancel.clone()
    }

    pub fn run(&self, sources: &[DataSource]) -> Result<RunReport, OrchestratorError> {
        let start = Instant::now();
        let mode = self.ctx.config.staging_mode;

        if mode == StagingMode::Staged && self.placement.capacity(PlacementStrategy::Spread) == 0 {
            return Err(PlacementError::NoCapacity.into());
        }

        let sources = unique_sources(sources);
        let (located, elapsed) = measure_time(|| self.locate_all(&sources));
        let attempted: usize = located.iter().map(BTreeSet::len).sum();
        log::info!("Located {} partitions across {} sources in {}", attempted, sources.len(), format_duration(elapsed));

        let collector = ResultCollector::new();
        let pipeline = Arc::new(PartitionPipeline::new(self.ctx.clone(), Arc::clone(&self.routines)));
        let mut dispatch = Dispatch::default();
        let mut staging_failures = Vec::new();

        match mode {
            StagingMode::Direct => {
                for (source, keys) in sources.iter().zip(&located) {
                    for key in keys {
                        dispatch.submit(&self.ctx.scheduler, &pipeline, source, key, LoaderStrategy::OnDemand);
                    }
                }
            }
            StagingMode::Staged => {
                let to_stage: Vec<(DataSource, &BTreeSet<PartitionKey>)> = sources.iter()
                    .zip(&located)
                    .filter(|(_, keys)| !keys.is_empty())
                    .map(|(source, keys)| (source.clone(), keys))
                    .collect();
                let staging_sources: Vec<DataSource> = to_stage.iter().map(|(s, _)| s.clone()).collect();

                let stager = Stager::new(self.ctx.clone(), Arc::clone(&self.placement));
                let staged = stager.stage_all(&staging_sources)?;

                for ((source, keys), outcome) in to_stage.iter().zip(staged) {
                    match outcome {
                        Ok(handles) => {
                            for (key, handle) in &handles {
                                if !keys.contains(key) {
                                    self.ctx.store.remove(handle);
                                }
                            }
                            for key in keys.iter() {
                                match handles.get(key) {
                                    Some(handle) => dispatch.submit(
                                        &self.ctx.scheduler, &pipeline, source, key, LoaderStrategy::Staged(*handle),
                                    ),
                                    None => collector.collect(PipelineResult::empty(
                                        source.uri(), key.clone(), EmptyReason::KeyAbsent,
                                    )),
                                }
                            }
                        }
                        Err(e) => {
                            let failure = match &e {
                                StagingError::Cancelled => PipelineFailure::Cancelled,
                                other => PipelineFailure::SourceUnreadable(other.to_string()),
                            };
                            for key in keys.iter() {
                                collector.collect(PipelineResult::failed(source.uri(), key.clone(), failure.clone()));
                            }
                            staging_failures.push(StagingFailure {
                                source: source.uri().to_string(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        log::info!("Dispatched {} partition pipelines", dispatch.len());
        collector.collect_all(dispatch.await_all(&self.ctx.scheduler));

        let report = RunReport::new(collector.into_sorted(), start.elapsed(), mode, staging_failures);
        log::info!(
            "Run finished in {:.2?}: {} attempted, {} with results, {} empty, {} failed",
            report.duration(), report.attempted(), report.with_results(), report.empty(), report.failed()
        );
        Ok(report)
    }

    /// Keys per source, in source order. Locator tasks run concurrently.
    fn locate_all(&self, sources: &[DataSource]) -> Vec<BTreeSet<PartitionKey>> {
        let locator = PartitionLocator::new(&self.ctx.config.key_column);
        let futures: Vec<_> = sources.iter()
            .map(|source| {
                let locator = locator.clone();
                let source = source.clone();
                self.ctx.scheduler.submit(format!("locate:{}", source.uri()), Placement::Any, move |_| {
                    locator.locate(&source)
                })
            })
            .collect();

        sources.iter()
            .zip(self.ctx.scheduler.await_all(futures))
            .map(|(source, result)| {
                result.unwrap_or_else(|e| {
                    log::warn!("Skipping source {}: {}", source.uri(), e);
                    BTreeSet::new()
                })
            })
            .collect()
    }
}

/// Pipeline futures with the (source, key) each belongs to.
#[derive(Default)]
struct Dispatch {
    pending: Vec<(String, PartitionKey)>,
    futures: Vec<TaskFuture<PipelineResult>>,
}

impl Dispatch {
    fn submit(
        &mut self,
        scheduler: &TaskScheduler,
        pipeline: &Arc<PartitionPipeline>,
        source: &DataSource,
        key: &PartitionKey,
        strategy: LoaderStrategy,
    ) {
        self.pending.push((source.uri().to_string(), key.clone()));

        let pipeline = Arc::clone(pipeline);
        let source = source.clone();
        let key = key.clone();
        let name = format!("pipeline:{}/{}", source.uri(), key);
        self.futures.push(scheduler.submit(name, Placement::Any, move |_| {
            pipeline.run(&source, &key, &strategy)
        }));
    }

    fn len(&self) -> usize {
        self.futures.len()
    }

    fn await_all(self, scheduler: &TaskScheduler) -> Vec<PipelineResult> {
        self.pending.into_iter()
            .zip(scheduler.await_all(self.futures))
            .map(|((source, key), result)| {
                result.unwrap_or_else(|e| {
                    let message = match e {
                        TaskError::Panicked { message, .. } => message,
                        abandoned @ TaskError::Abandoned(_) => abandoned.to_string(),
                    };
                    PipelineResult::failed(&source, key, PipelineFailure::Panicked(message))
                })
            })
            .collect()
    }
}

/// First occurrence of every uri; later duplicates are skipped.
fn unique_sources(sources: &[DataSource]) -> Vec<DataSource> {
    let mut seen = HashSet::new();
    sources.iter()
        .filter(|source| {
            let fresh = seen.insert(source.uri().to_string());
            if !fresh {
                log::warn!("Duplicate source {} ignored", source.uri());
            }
            fresh
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaConfig;
    use crate::orchestration::outcome::PipelineOutcome;
    use crate::source::{KeyScan, Row, RowReader, SourceError};
    use crate::training::{Artifact, RoutineError};
    use serde_json::json;
    use std::collections::BTreeMap;

    /// Predicts `x + offset`; refuses to fit when `fail_on_flag` is set and
    /// any training row carries the flag feature.
    struct Offset {
        name: &'static str,
        offset: f64,
        fail_on_flag: bool,
    }

    impl CandidateRoutine for Offset {
        fn name(&self) -> &str {
            self.name
        }

        fn fit(&self, features: &[Vec<f64>], _: &[f64]) -> Result<Artifact, RoutineError> {
            if self.fail_on_flag && features.iter().any(|row| row[1] > 0.0) {
                return Err(RoutineError::Other("flagged partition".to_string()));
            }
            Ok(Arc::new(self.offset))
        }

        fn predict(&self, artifact: &Artifact, features: &[Vec<f64>]) -> Result<Vec<f64>, RoutineError> {
            let offset = *(**artifact).downcast_ref::<f64>().unwrap();
            Ok(features.iter().map(|row| row[0] + offset).collect())
        }
    }

    /// Lists keys but cannot produce rows.
    struct FlakyReader;

    impl RowReader for FlakyReader {
        fn uri(&self) -> &str {
            "mem://flaky"
        }

        fn scan_keys(&self, _: &str) -> Result<KeyScan, SourceError> {
            let mut scan = KeyScan::default();
            scan.keys.insert(PartitionKey::Int(1));
            scan.keys.insert(PartitionKey::Int(2));
            Ok(scan)
        }

        fn read_partition(&self, _: &str, _: &PartitionKey, _: &[String]) -> Result<Vec<Row>, SourceError> {
            Err(SourceError::Unreadable("disk went away".to_string()))
        }

        fn read_grouped(&self, _: &str, _: &[String]) -> Result<BTreeMap<PartitionKey, Vec<Row>>, SourceError> {
            Err(SourceError::Unreadable("disk went away".to_string()))
        }
    }

    fn routines() -> Vec<Arc<dyn CandidateRoutine>> {
        vec![
            Arc::new(Offset { name: "first", offset: 5.0, fail_on_flag: false }),
            Arc::new(Offset { name: "second", offset: 3.0, fail_on_flag: true }),
        ]
    }

    fn config(mode: StagingMode) -> RunConfig {
        RunConfig::new()
            .with_staging_mode(mode)
            .with_key_column("k")
            .with_min_rows(4)
            .with_worker_threads(3)
            .with_placement(2, 1)
            .with_schema(SchemaConfig::new("y").with_features(&["x", "flag"]))
    }

    fn rows(key: &str, n: usize, flag: u8) -> Vec<Row> {
        (0..n)
            .map(|i| json!({"k": key, "x": i, "y": i, "flag": flag, "noise": "ignored"}))
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn scenario_source() -> DataSource {
        let mut all = rows("A", 2, 0);
        all.extend(rows("B", 10, 1));
        all.extend(rows("C", 10, 0));
        DataSource::in_memory("mem://scenario", all, vec!["x".into(), "y".into(), "flag".into()])
    }

    fn ranking(result: &PipelineResult) -> Vec<(String, f64)> {
        result.ranked()
            .map(|r| r.iter().map(|e| (e.routine.clone(), e.error_score)).collect())
            .unwrap_or_default()
    }

    fn assert_scenario(report: &RunReport) {
        assert_eq!(report.attempted(), 3);
        assert_eq!(report.with_results(), 2);

        let a = report.get("mem://scenario", &PartitionKey::from("A")).unwrap();
        assert!(matches!(a.outcome, PipelineOutcome::Empty(EmptyReason::InsufficientData { rows: 2, required: 4 })));

        let b = report.get("mem://scenario", &PartitionKey::from("B")).unwrap();
        assert_eq!(ranking(b), vec![("first".to_string(), 5.0)]);
        assert_eq!(b.trainer_failures.len(), 1);
        assert_eq!(b.trainer_failures[0].index, 1);

        let c = report.get("mem://scenario", &PartitionKey::from("C")).unwrap();
        assert_eq!(ranking(c), vec![("second".to_string(), 3.0), ("first".to_string(), 5.0)]);
    }

    #[test]
    fn test_direct_scenario() {
        let coordinator = RunCoordinator::new(config(StagingMode::Direct), routines()).unwrap();
        let report = coordinator.run(&[scenario_source()]).unwrap();
        assert_scenario(&report);
        assert_eq!(report.staging_mode(), StagingMode::Direct);
    }

    #[test]
    fn test_staged_scenario_matches_direct() {
        let coordinator = RunCoordinator::new(config(StagingMode::Staged), routines()).unwrap();
        let report = coordinator.run(&[scenario_source()]).unwrap();
        assert_scenario(&report);

        let direct = RunCoordinator::new(config(StagingMode::Direct), routines()).unwrap()
            .run(&[scenario_source()])
            .unwrap();
        let staged_parts = report.summary().partitions;
        let direct_parts = direct.summary().partitions;
        assert_eq!(staged_parts, direct_parts);
    }

    /// Scans one key but yields a second partition when read in full.
    struct GrowingReader;

    impl RowReader for GrowingReader {
        fn uri(&self) -> &str {
            "mem://growing"
        }

        fn scan_keys(&self, _: &str) -> Result<KeyScan, SourceError> {
            let mut scan = KeyScan::default();
            scan.keys.insert(PartitionKey::from("C"));
            Ok(scan)
        }

        fn read_partition(&self, _: &str, _: &PartitionKey, _: &[String]) -> Result<Vec<Row>, SourceError> {
            Ok(rows("C", 10, 0))
        }

        fn read_grouped(&self, _: &str, _: &[String]) -> Result<BTreeMap<PartitionKey, Vec<Row>>, SourceError> {
            let mut groups = BTreeMap::new();
            groups.insert(PartitionKey::from("C"), rows("C", 10, 0));
            groups.insert(PartitionKey::from("D"), rows("D", 10, 0));
            Ok(groups)
        }
    }

    #[test]
    fn test_staged_runs_leave_store_empty() {
        let coordinator = RunCoordinator::new(config(StagingMode::Staged), routines()).unwrap();
        for _ in 0..3 {
            let report = coordinator.run(&[scenario_source()]).unwrap();
            assert_eq!(report.with_results(), 2);
            assert!(coordinator.context().store.is_empty());
            assert_eq!(coordinator.context().store.total_bytes(), 0);
        }
    }

    #[test]
    fn test_unlocated_staged_partitions_are_released() {
        let coordinator = RunCoordinator::new(config(StagingMode::Staged), routines()).unwrap();
        let report = coordinator.run(&[DataSource::new(Arc::new(GrowingReader), vec![])]).unwrap();

        assert_eq!(report.attempted(), 1);
        assert!(report.get("mem://growing", &PartitionKey::from("D")).is_none());
        assert!(coordinator.context().store.is_empty());
    }

    #[test]
    fn test_results_sorted_by_source_then_key() {
        let coordinator = RunCoordinator::new(config(StagingMode::Direct), routines()).unwrap();
        let other = DataSource::in_memory("mem://a-first", rows("Z", 6, 0), vec![]);
        let report = coordinator.run(&[scenario_source(), other]).unwrap();

        let order: Vec<(&str, String)> = report.results().iter()
            .map(|r| (r.source.as_str(), r.key.to_string()))
            .collect();
        assert_eq!(order, vec![
            ("mem://a-first", "Z".to_string()),
            ("mem://scenario", "A".to_string()),
            ("mem://scenario", "B".to_string()),
            ("mem://scenario", "C".to_string()),
        ]);
    }

    #[test]
    fn test_attempted_counts_unreadable_partitions() {
        let coordinator = RunCoordinator::new(config(StagingMode::Direct), routines()).unwrap();
        let flaky = DataSource::new(Arc::new(FlakyReader), vec![]);
        let missing = DataSource::json_lines("/no/such/source.jsonl", vec![]);
        let report = coordinator.run(&[scenario_source(), flaky, missing]).unwrap();

        assert_eq!(report.attempted(), 5);
        assert_eq!(report.with_results(), 2);
        let flaky_result = report.get("mem://flaky", &PartitionKey::Int(1)).unwrap();
        assert!(matches!(flaky_result.outcome, PipelineOutcome::Empty(EmptyReason::SourceUnreadable { .. })));
    }

    #[test]
    fn test_staged_failing_source_does_not_block_others() {
        let placement = Arc::new(LocalPlacement::new(2, 1));
        let coordinator = RunCoordinator::new(config(StagingMode::Staged), routines()).unwrap()
            .with_placement(placement.clone());
        let flaky = DataSource::new(Arc::new(FlakyReader), vec![]);
        let report = coordinator.run(&[flaky, scenario_source()]).unwrap();

        assert_eq!(report.attempted(), 5);
        assert_eq!(report.with_results(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.staging_failures().len(), 1);
        assert_eq!(report.staging_failures()[0].source, "mem://flaky");
        assert!(matches!(
            report.get("mem://flaky", &PartitionKey::Int(2)).unwrap().outcome,
            PipelineOutcome::Failed(PipelineFailure::SourceUnreadable(_))
        ));
        assert_eq!(placement.active_slots(), 0);
    }

    #[test]
    fn test_staging_dispatches_one_task_per_host() {
        let coordinator = RunCoordinator::new(config(StagingMode::Staged).with_placement(3, 1), routines()).unwrap();
        let sources: Vec<_> = (0..3)
            .map(|i| DataSource::in_memory(&format!("mem://{}", i), rows("K", 6, 0), vec![]))
            .collect();
        let report = coordinator.run(&sources).unwrap();
        assert_eq!(report.with_results(), 3);

        let dispatches = coordinator.context().scheduler.stats().host_dispatches;
        assert_eq!(dispatches.len(), 3);
        assert!(dispatches.values().all(|&n| n == 1));
    }

    #[test]
    fn test_staged_without_capacity_is_fatal() {
        let coordinator = RunCoordinator::new(config(StagingMode::Staged), routines()).unwrap()
            .with_placement(Arc::new(LocalPlacement::new(0, 1)));
        assert!(matches!(
            coordinator.run(&[scenario_source()]),
            Err(OrchestratorError::Placement(PlacementError::NoCapacity))
        ));
    }

    #[test]
    fn test_no_routines_rejected() {
        assert!(matches!(
            RunCoordinator::new(config(StagingMode::Direct), Vec::new()),
            Err(OrchestratorError::NoRoutines)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            RunCoordinator::new(config(StagingMode::Direct).with_split_ratio(1.5), routines()),
            Err(OrchestratorError::Config(_))
        ));
    }

    #[test]
    fn test_cancelled_run_records_every_partition() {
        let coordinator = RunCoordinator::new(config(StagingMode::Direct), routines()).unwrap();
        coordinator.cancel_flag().cancel();
        let report = coordinator.run(&[scenario_source()]).unwrap();

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.failed(), 3);
        assert!(report.results().iter()
            .all(|r| matches!(r.outcome, PipelineOutcome::Failed(PipelineFailure::Cancelled))));
    }

    #[test]
    fn test_duplicate_sources_processed_once() {
        let coordinator = RunCoordinator::new(config(StagingMode::Direct), routines()).unwrap();
        let report = coordinator.run(&[scenario_source(), scenario_source()]).unwrap();
        assert_eq!(report.attempted(), 3);
    }

    #[test]
    fn test_fixed_seed_reproduces_run() {
        let run = || {
            RunCoordinator::new(config(StagingMode::Direct).with_seed(7), vec![Arc::new(crate::training::MeanBaseline) as Arc<dyn CandidateRoutine>])
                .unwrap()
                .run(&[scenario_source()])
                .unwrap()
                .summary()
                .partitions
        };
        assert_eq!(run(), run());
    }
}
