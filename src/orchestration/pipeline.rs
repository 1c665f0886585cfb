// Mon Jan 26 2026 - Alex

use crate::orchestration::outcome::{EmptyReason, PipelineFailure, PipelineOutcome, PipelineResult};
use crate::runtime::scheduler::panic_message;
use crate::runtime::RunContext;
use crate::source::{BatchLoader, DataSource, LoadedBatch, LoaderStrategy, PartitionKey};
use crate::training::{CandidateRoutine, EvaluationGroup, EvaluationOutcome};
use crate::transform::{BatchTransformer, FeatureBatch};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

enum Prepared {
    Features(FeatureBatch),
    Empty(EmptyReason),
}

/// Load, transform and evaluate one (source, key) pair.
pub struct PartitionPipeline {
    ctx: RunContext,
    routines: Arc<[Arc<dyn CandidateRoutine>]>,
    loader: BatchLoader,
    transformer: BatchTransformer,
}

impl PartitionPipeline {
    pub fn new(ctx: RunContext, routines: Arc<[Arc<dyn CandidateRoutine>]>) -> Self {
        let loader = BatchLoader::new(&ctx.config.key_column, ctx.store.clone());
        let transformer = BatchTransformer::new(ctx.config.schema.clone());
        Self {
            ctx,
            routines,
            loader,
            transformer,
        }
    }

    /// Run the pipeline. A staged batch is released from the store once
    /// evaluation is done, whatever the outcome.
    pub fn run(&self, source: &DataSource, key: &PartitionKey, strategy: &LoaderStrategy) -> PipelineResult {
        let result = self.execute(source, key, strategy);
        if let LoaderStrategy::Staged(handle) = strategy {
            self.ctx.store.remove(handle);
        }
        result
    }

    fn execute(&self, source: &DataSource, key: &PartitionKey, strategy: &LoaderStrategy) -> PipelineResult {
        if self.ctx.cancel.is_cancelled() {
            log::debug!("{}/{}: cancelled before start", source.uri(), key);
            return PipelineResult::failed(source.uri(), key.clone(), PipelineFailure::Cancelled);
        }

        let prepared = panic::catch_unwind(AssertUnwindSafe(|| self.prepare(source, key, strategy)))
            .unwrap_or_else(|payload| Err(PipelineFailure::Panicked(panic_message(payload.as_ref()))));

        let features = match prepared {
            Ok(Prepared::Features(features)) => features,
            Ok(Prepared::Empty(reason)) => {
                log::debug!("{}/{}: {}", source.uri(), key, reason);
                return PipelineResult::empty(source.uri(), key.clone(), reason);
            }
            Err(failure) => {
                log::warn!("{}/{}: {}", source.uri(), key, failure);
                return PipelineResult::failed(source.uri(), key.clone(), failure);
            }
        };

        let evaluation = EvaluationGroup::new(&self.ctx, &self.routines).evaluate(&features);
        let outcome = match evaluation.outcome {
            EvaluationOutcome::Ranked(ranked) => {
                log::debug!("{}/{}: best routine '{}' ({:.6})",
                    source.uri(), key, ranked.best().routine, ranked.best().error_score);
                PipelineOutcome::Ranked(ranked)
            }
            EvaluationOutcome::Empty(reason) => PipelineOutcome::Empty(reason),
        };

        PipelineResult {
            source: source.uri().to_string(),
            key: key.clone(),
            outcome,
            dropped_rows: features.dropped_rows,
            trainer_failures: evaluation.failures,
        }
    }

    fn prepare(
        &self,
        source: &DataSource,
        key: &PartitionKey,
        strategy: &LoaderStrategy,
    ) -> Result<Prepared, PipelineFailure> {
        let loaded = self.loader.load(source, key, strategy)
            .map_err(|e| PipelineFailure::Load(e.to_string()))?;

        match loaded {
            LoadedBatch::Rows(batch) => Ok(Prepared::Features(self.transformer.transform(&batch))),
            LoadedBatch::Empty(reason) => Ok(Prepared::Empty(reason)),
        }
    }
}
