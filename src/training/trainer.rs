// Sun Jan 25 2026 - Alex

use crate::training::metrics::{mean_absolute_error, ScoringError};
use crate::training::routine::{Artifact, CandidateRoutine, RoutineError};
use crate::training::split::TrainTestSplit;
use std::fmt;
use thiserror::Error;

/// One routine's fitted artifact and its held-out score.
#[derive(Clone)]
pub struct TrainerResult {
    pub routine: String,
    /// Position of the routine in the declared routine set.
    pub index: usize,
    pub artifact: Artifact,
    pub error_score: f64,
}

impl fmt::Debug for TrainerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainerResult")
            .field("routine", &self.routine)
            .field("index", &self.index)
            .field("error_score", &self.error_score)
            .finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureCause {
    #[error("fit failed: {0}")]
    Fit(RoutineError),
    #[error("predict failed: {0}")]
    Predict(RoutineError),
    #[error("scoring failed: {0}")]
    Scoring(ScoringError),
    #[error("panicked: {0}")]
    Panicked(String),
    #[error("cancelled before start")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Routine '{routine}' (#{index}) {cause}")]
pub struct TrainingFailure {
    pub routine: String,
    pub index: usize,
    pub cause: FailureCause,
}

impl TrainingFailure {
    pub fn new(routine: &str, index: usize, cause: FailureCause) -> Self {
        Self {
            routine: routine.to_string(),
            index,
            cause,
        }
    }
}

/// Fits one routine on the training side of a split and scores it on the test side.
pub struct TrainerUnit;

impl TrainerUnit {
    pub fn run(
        split: &TrainTestSplit,
        routine: &dyn CandidateRoutine,
        index: usize,
    ) -> Result<TrainerResult, TrainingFailure> {
        let fail = |cause| TrainingFailure::new(routine.name(), index, cause);

        let artifact = routine.fit(&split.train_features, &split.train_target)
            .map_err(|e| fail(FailureCause::Fit(e)))?;
        let predicted = routine.predict(&artifact, &split.test_features)
            .map_err(|e| fail(FailureCause::Predict(e)))?;
        let error_score = mean_absolute_error(&predicted, &split.test_target)
            .map_err(|e| fail(FailureCause::Scoring(e)))?;

        log::debug!("Routine '{}' (#{}) scored {:.6}", routine.name(), index, error_score);

        Ok(TrainerResult {
            routine: routine.name().to_string(),
            index,
            artifact,
            error_score,
        })
    }
}
