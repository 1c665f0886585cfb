// Sat Jan 24 2026 - Alex

pub mod evaluation;
pub mod metrics;
pub mod routine;
pub mod routines;
pub mod split;
pub mod trainer;

pub use evaluation::{EvaluationGroup, EvaluationOutcome, GroupEvaluation, RankedResults};
pub use metrics::{mean_absolute_error, ScoringError};
pub use routine::{Artifact, CandidateRoutine, RoutineError};
pub use routines::{routine_by_name, LinearModel, LinearRegression, MeanBaseline};
pub use split::{split_seed, TrainTestSplit};
pub use trainer::{FailureCause, TrainerResult, TrainerUnit, TrainingFailure};
