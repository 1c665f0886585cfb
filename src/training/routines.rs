// Sat Jan 24 2026 - Alex

use crate::training::routine::{check_training_input, Artifact, CandidateRoutine, RoutineError};
use std::sync::Arc;

const PIVOT_EPSILON: f64 = 1e-12;

/// Predicts the training mean for every row.
#[derive(Debug, Clone, Default)]
pub struct MeanBaseline;

#[derive(Debug, Clone, Copy, PartialEq)]
struct MeanModel(f64);

impl CandidateRoutine for MeanBaseline {
    fn name(&self) -> &str {
        "mean"
    }

    fn fit(&self, features: &[Vec<f64>], target: &[f64]) -> Result<Artifact, RoutineError> {
        check_training_input(features, target)?;
        let mean = target.iter().sum::<f64>() / target.len() as f64;
        Ok(Arc::new(MeanModel(mean)))
    }

    fn predict(&self, artifact: &Artifact, features: &[Vec<f64>]) -> Result<Vec<f64>, RoutineError> {
        let model = (**artifact).downcast_ref::<MeanModel>()
            .ok_or_else(|| RoutineError::ForeignArtifact(self.name().to_string()))?;
        Ok(vec![model.0; features.len()])
    }
}

/// Least squares with an intercept, solved through the normal equations.
/// A positive `alpha` adds a ridge penalty on the coefficients (never the
/// intercept).
#[derive(Debug, Clone)]
pub struct LinearRegression {
    name: String,
    alpha: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept + self.coefficients.iter().zip(row).map(|(c, x)| c * x).sum::<f64>()
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            name: "linear".to_string(),
            alpha: 0.0,
        }
    }

    pub fn ridge(alpha: f64) -> Self {
        Self {
            name: "ridge".to_string(),
            alpha: alpha.max(0.0),
        }
    }
}

impl CandidateRoutine for LinearRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, features: &[Vec<f64>], target: &[f64]) -> Result<Artifact, RoutineError> {
        let width = check_training_input(features, target)?;
        let dim = width + 1;

        // Augmented [XᵀX | Xᵀy] with a leading column of ones for the intercept.
        let mut system = vec![vec![0.0; dim + 1]; dim];
        for (row, &y) in features.iter().zip(target) {
            let x: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
            for i in 0..dim {
                for j in 0..dim {
                    system[i][j] += x[i] * x[j];
                }
                system[i][dim] += x[i] * y;
            }
        }
        for (i, eq) in system.iter_mut().enumerate().skip(1) {
            eq[i] += self.alpha;
        }

        let solution = solve(system)?;
        Ok(Arc::new(LinearModel {
            intercept: solution[0],
            coefficients: solution[1..].to_vec(),
        }))
    }

    fn predict(&self, artifact: &Artifact, features: &[Vec<f64>]) -> Result<Vec<f64>, RoutineError> {
        let model = (**artifact).downcast_ref::<LinearModel>()
            .ok_or_else(|| RoutineError::ForeignArtifact(self.name.clone()))?;

        features.iter()
            .map(|row| {
                if row.len() != model.coefficients.len() {
                    return Err(RoutineError::RaggedFeatures {
                        expected: model.coefficients.len(),
                        found: row.len(),
                    });
                }
                Ok(model.predict_row(row))
            })
            .collect()
    }
}

/// Gaussian elimination with partial pivoting on an augmented matrix.
fn solve(mut m: Vec<Vec<f64>>) -> Result<Vec<f64>, RoutineError> {
    let n = m.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .ok_or(RoutineError::Singular)?;
        if m[pivot][col].abs() < PIVOT_EPSILON {
            return Err(RoutineError::Singular);
        }
        m.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = m[row][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| m[row][k] * x[k]).sum();
        x[row] = (m[row][n] - tail) / m[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(RoutineError::Singular)
    }
}

/// Built-in routine for a CLI name: `mean`, `linear` or `ridge`.
pub fn routine_by_name(name: &str) -> Option<Arc<dyn CandidateRoutine>> {
    match name.trim().to_lowercase().as_str() {
        "mean" => Some(Arc::new(MeanBaseline)),
        "linear" => Some(Arc::new(LinearRegression::new())),
        "ridge" => Some(Arc::new(LinearRegression::ridge(1.0))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_baseline() {
        let routine = MeanBaseline;
        let artifact = routine.fit(&[vec![], vec![], vec![]], &[1.0, 2.0, 6.0]).unwrap();
        assert_eq!(routine.predict(&artifact, &[vec![], vec![]]).unwrap(), vec![3.0, 3.0]);
    }

    #[test]
    fn test_linear_recovers_exact_fit() {
        // y = 1 + 2a - 3b
        let features: Vec<Vec<f64>> = vec![
            vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 1.0], vec![3.0, 5.0],
        ];
        let target: Vec<f64> = features.iter().map(|r| 1.0 + 2.0 * r[0] - 3.0 * r[1]).collect();

        let routine = LinearRegression::new();
        let artifact = routine.fit(&features, &target).unwrap();
        let model = artifact.downcast_ref::<LinearModel>().unwrap();
        assert!(close(model.intercept, 1.0));
        assert!(close(model.coefficients[0], 2.0));
        assert!(close(model.coefficients[1], -3.0));

        let predicted = routine.predict(&artifact, &[vec![10.0, 1.0]]).unwrap();
        assert!(close(predicted[0], 18.0));
    }

    #[test]
    fn test_collinear_features_are_singular() {
        let features = vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]];
        let target = vec![1.0, 2.0, 3.0];
        assert_eq!(LinearRegression::new().fit(&features, &target).err(), Some(RoutineError::Singular));
        assert!(LinearRegression::ridge(0.5).fit(&features, &target).is_ok());
    }

    #[test]
    fn test_foreign_artifact_rejected() {
        let artifact = MeanBaseline.fit(&[vec![1.0]], &[1.0]).unwrap();
        assert!(matches!(
            LinearRegression::new().predict(&artifact, &[vec![1.0]]),
            Err(RoutineError::ForeignArtifact(_))
        ));
    }

    #[test]
    fn test_routine_by_name() {
        assert_eq!(routine_by_name("mean").unwrap().name(), "mean");
        assert_eq!(routine_by_name(" Linear ").unwrap().name(), "linear");
        assert_eq!(routine_by_name("ridge").unwrap().name(), "ridge");
        assert!(routine_by_name("forest").is_none());
    }
}
