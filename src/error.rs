//! Error types.

use thiserror::Error;

/// Errors surfaced by the placement optimizer.
///
/// Partial infeasibility during decode is handled locally and never
/// reaches this type; only configuration, model, and post-repair
/// validation failures do.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid system model: {0}")]
    InvalidModel(String),

    #[error("solution violates invariants for application {app}: {reason}")]
    InvalidSolution { app: usize, reason: String },

    #[error("worker pool error: {0}")]
    ThreadPool(String),

    #[error("population is empty")]
    EmptyPopulation,
}

pub type Result<T> = std::result::Result<T, PlacementError>;
