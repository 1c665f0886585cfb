// Tue Jan 20 2026 - Alex

pub mod config;
pub mod error;
pub mod orchestration;
pub mod runtime;
pub mod source;
pub mod training;
pub mod transform;
pub mod ui;
pub mod utils;

pub use config::{RunConfig, SchemaConfig, StagingMode};
pub use error::OrchestratorError;
pub use orchestration::{PipelineOutcome, PipelineResult, RunCoordinator, RunReport, RunSummary};
pub use runtime::{ObjectStore, RunContext, TaskScheduler};
pub use source::{DataSource, PartitionKey};
pub use training::{CandidateRoutine, LinearRegression, MeanBaseline};
