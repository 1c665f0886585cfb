// Thu Jan 22 2026 - Alex

use crate::utils::Digest;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("Task '{task}' panicked: {message}")]
    Panicked { task: String, message: String },
    #[error("Task '{0}' was dropped before it ran")]
    Abandoned(String),
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid worker count: {0}")]
    InvalidThreadCount(usize),
    #[error("Failed to start worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to encode object: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode object {id}: {source}")]
    Decode {
        id: Digest,
        #[source]
        source: serde_json::Error,
    },
    #[error("Object not found: {0}")]
    Missing(Digest),
    #[error("Digest collision on object {0}")]
    Collision(Digest),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    #[error("Cannot reserve {requested} slots, only {available} available")]
    Insufficient { requested: usize, available: usize },
    #[error("Placement service has no capacity")]
    NoCapacity,
}
