// Mon Jan 26 2026 - Alex

use crate::source::PartitionKey;
use crate::training::{RankedResults, TrainingFailure};
use serde::Serialize;
use thiserror::Error;

/// Why a partition produced no ranking. Expected outcomes, not errors.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EmptyReason {
    #[error("source unreadable: {message}")]
    SourceUnreadable { message: String },
    #[error("no rows for key")]
    KeyAbsent,
    #[error("insufficient data: {rows} rows, {required} required")]
    InsufficientData { rows: usize, required: usize },
    #[error("all {failed} routines failed")]
    AllRoutinesFailed { failed: usize },
}

/// Unexpected failure confined to one partition; siblings are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "failure", content = "detail", rename_all = "snake_case")]
pub enum PipelineFailure {
    #[error("load failed: {0}")]
    Load(String),
    #[error("pipeline panicked: {0}")]
    Panicked(String),
    #[error("staging failed: {0}")]
    SourceUnreadable(String),
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Ranked(RankedResults),
    Empty(EmptyReason),
    Failed(PipelineFailure),
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub source: String,
    pub key: PartitionKey,
    pub outcome: PipelineOutcome,
    pub dropped_rows: usize,
    pub trainer_failures: Vec<TrainingFailure>,
}

impl PipelineResult {
    pub fn new(source: &str, key: PartitionKey, outcome: PipelineOutcome) -> Self {
        Self {
            source: source.to_string(),
            key,
            outcome,
            dropped_rows: 0,
            trainer_failures: Vec::new(),
        }
    }

    pub fn empty(source: &str, key: PartitionKey, reason: EmptyReason) -> Self {
        Self::new(source, key, PipelineOutcome::Empty(reason))
    }

    pub fn failed(source: &str, key: PartitionKey, failure: PipelineFailure) -> Self {
        Self::new(source, key, PipelineOutcome::Failed(failure))
    }

    pub fn has_results(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Ranked(_))
    }

    pub fn ranked(&self) -> Option<&RankedResults> {
        match &self.outcome {
            PipelineOutcome::Ranked(ranked) => Some(ranked),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Failed(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Empty(_))
    }
}
