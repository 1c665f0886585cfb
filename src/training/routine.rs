// Sat Jan 24 2026 - Alex

use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// Whatever a routine produced from `fit`; only that routine can read it back.
pub type Artifact = Arc<dyn Any + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutineError {
    #[error("Empty training set")]
    EmptyInput,
    #[error("Feature rows have inconsistent width: expected {expected}, got {found}")]
    RaggedFeatures { expected: usize, found: usize },
    #[error("Features and target differ in length: {features} vs {target}")]
    LengthMismatch { features: usize, target: usize },
    #[error("Singular system; cannot solve")]
    Singular,
    #[error("Artifact was not produced by routine '{0}'")]
    ForeignArtifact(String),
    #[error("{0}")]
    Other(String),
}

/// A trainable candidate: `fit` on (features, target), then `predict`.
///
/// Implementations hold no mutable state; one instance is shared by every
/// trainer unit that evaluates it.
pub trait CandidateRoutine: Send + Sync {
    fn name(&self) -> &str;

    fn fit(&self, features: &[Vec<f64>], target: &[f64]) -> Result<Artifact, RoutineError>;

    fn predict(&self, artifact: &Artifact, features: &[Vec<f64>]) -> Result<Vec<f64>, RoutineError>;
}

/// Check the shape every routine expects before fitting.
pub fn check_training_input(features: &[Vec<f64>], target: &[f64]) -> Result<usize, RoutineError> {
    if target.is_empty() {
        return Err(RoutineError::EmptyInput);
    }
    if features.len() != target.len() {
        return Err(RoutineError::LengthMismatch {
            features: features.len(),
            target: target.len(),
        });
    }
    let width = features[0].len();
    if let Some(row) = features.iter().find(|r| r.len() != width) {
        return Err(RoutineError::RaggedFeatures {
            expected: width,
            found: row.len(),
        });
    }
    Ok(width)
}
