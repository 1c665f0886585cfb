// Sun Jan 25 2026 - Alex

use crate::orchestration::outcome::EmptyReason;
use crate::runtime::{Placement, RunContext, TaskError};
use crate::training::routine::CandidateRoutine;
use crate::training::split::{split_seed, TrainTestSplit};
use crate::training::trainer::{FailureCause, TrainerResult, TrainerUnit, TrainingFailure};
use crate::transform::FeatureBatch;
use std::sync::Arc;

/// Trainer results ordered by ascending score. Never empty.
#[derive(Debug, Clone)]
pub struct RankedResults {
    entries: Vec<TrainerResult>,
}

impl RankedResults {
    /// Ranks `results`; equal scores keep declaration order. `None` when empty.
    pub fn new(mut results: Vec<TrainerResult>) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        results.sort_by(|a, b| {
            a.error_score.total_cmp(&b.error_score).then(a.index.cmp(&b.index))
        });
        Some(Self { entries: results })
    }

    pub fn best(&self) -> &TrainerResult {
        &self.entries[0]
    }

    pub fn entries(&self) -> &[TrainerResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainerResult> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<TrainerResult> {
        self.entries
    }
}

#[derive(Debug, Clone)]
pub enum EvaluationOutcome {
    Ranked(RankedResults),
    Empty(EmptyReason),
}

#[derive(Debug, Clone)]
pub struct GroupEvaluation {
    pub outcome: EvaluationOutcome,
    pub failures: Vec<TrainingFailure>,
    pub units_issued: usize,
}

/// Fans one feature batch out to every routine and ranks what comes back.
pub struct EvaluationGroup<'a> {
    ctx: &'a RunContext,
    routines: &'a [Arc<dyn CandidateRoutine>],
}

impl<'a> EvaluationGroup<'a> {
    pub fn new(ctx: &'a RunContext, routines: &'a [Arc<dyn CandidateRoutine>]) -> Self {
        Self { ctx, routines }
    }

    pub fn evaluate(&self, batch: &FeatureBatch) -> GroupEvaluation {
        let required = self.ctx.config.min_rows_per_partition;
        if batch.len() < required {
            log::debug!("{}/{}: {} usable rows, {} required", batch.source, batch.key, batch.len(), required);
            return GroupEvaluation {
                outcome: EvaluationOutcome::Empty(EmptyReason::InsufficientData {
                    rows: batch.len(),
                    required,
                }),
                failures: Vec::new(),
                units_issued: 0,
            };
        }

        let seed = split_seed(self.ctx.config.seed, &batch.source, &batch.key);
        let split = Arc::new(TrainTestSplit::new(batch, self.ctx.config.split_ratio, seed));

        let mut failures = Vec::new();
        let mut issued = Vec::with_capacity(self.routines.len());
        let mut futures = Vec::with_capacity(self.routines.len());

        for (index, routine) in self.routines.iter().enumerate() {
            if self.ctx.cancel.is_cancelled() {
                failures.push(TrainingFailure::new(routine.name(), index, FailureCause::Cancelled));
                continue;
            }

            let split = Arc::clone(&split);
            let routine_ref = Arc::clone(routine);
            let cancel = self.ctx.cancel.clone();
            let name = format!("train:{}/{}:{}", batch.source, batch.key, routine.name());

            futures.push(self.ctx.scheduler.submit(name, Placement::Any, move |_| {
                if cancel.is_cancelled() {
                    return Err(TrainingFailure::new(routine_ref.name(), index, FailureCause::Cancelled));
                }
                TrainerUnit::run(&split, routine_ref.as_ref(), index)
            }));
            issued.push((index, routine.name().to_string()));
        }

        let units_issued = futures.len();
        let mut results = Vec::with_capacity(units_issued);

        for ((index, routine), outcome) in issued.into_iter().zip(self.ctx.scheduler.await_all(futures)) {
            match outcome {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(failure)) => failures.push(failure),
                Err(TaskError::Panicked { message, .. }) => {
                    failures.push(TrainingFailure::new(&routine, index, FailureCause::Panicked(message)));
                }
                Err(TaskError::Abandoned(task)) => {
                    failures.push(TrainingFailure::new(&routine, index, FailureCause::Panicked(
                        format!("task '{}' abandoned", task),
                    )));
                }
            }
        }

        failures.sort_by_key(|f| f.index);
        for failure in &failures {
            log::warn!("{}/{}: {}", batch.source, batch.key, failure);
        }

        let outcome = match RankedResults::new(results) {
            Some(ranked) => EvaluationOutcome::Ranked(ranked),
            None => EvaluationOutcome::Empty(EmptyReason::AllRoutinesFailed {
                failed: failures.len(),
            }),
        };

        GroupEvaluation {
            outcome,
            failures,
            units_issued,
        }
    }
}
