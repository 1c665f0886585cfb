// Sat Jan 24 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Nothing to score")]
    Empty,
    #[error("Got {predicted} predictions for {expected} targets")]
    LengthMismatch { predicted: usize, expected: usize },
    #[error("Non-finite prediction at row {0}")]
    NonFinitePrediction(usize),
    #[error("Score is not finite")]
    NonFiniteScore,
}

/// Mean absolute error. Lower is better; always finite and non-negative on `Ok`.
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> Result<f64, ScoringError> {
    if actual.is_empty() {
        return Err(ScoringError::Empty);
    }
    if predicted.len() != actual.len() {
        return Err(ScoringError::LengthMismatch {
            predicted: predicted.len(),
            expected: actual.len(),
        });
    }
    if let Some(row) = predicted.iter().position(|p| !p.is_finite()) {
        return Err(ScoringError::NonFinitePrediction(row));
    }

    let total: f64 = predicted.iter().zip(actual).map(|(p, a)| (p - a).abs()).sum();
    let score = total / actual.len() as f64;
    if score.is_finite() {
        Ok(score)
    } else {
        Err(ScoringError::NonFiniteScore)
    }
}
