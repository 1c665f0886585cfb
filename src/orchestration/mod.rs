// Mon Jan 26 2026 - Alex

pub mod collector;
pub mod coordinator;
pub mod outcome;
pub mod pipeline;
pub mod report;
pub mod staging;

pub use collector::ResultCollector;
pub use coordinator::RunCoordinator;
pub use outcome::{EmptyReason, PipelineFailure, PipelineOutcome, PipelineResult};
pub use pipeline::PartitionPipeline;
pub use report::{PartitionStatus, PartitionSummary, RankEntry, RunReport, RunSummary, StagingFailure};
pub use staging::{StagedBatches, Stager, StagingError};
