// Tue Jan 27 2026 - Alex

use crate::config::ConfigError;
use crate::runtime::{PlacementError, SchedulerError};
use thiserror::Error;

/// Failures that stop a run before any partition is processed.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scheduler unavailable: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("Placement unavailable: {0}")]
    Placement(#[from] PlacementError),
    #[error("No candidate routines given")]
    NoRoutines,
}
