//! Planner error types.

use thiserror::Error;

/// Fatal errors that stop a planning run before partitioning begins.
///
/// Reference problems are not errors; they surface as diagnostics.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("configuration error: {0}")]
    Config(#[from] stackpack_core::ConfigError),
}

pub type PlanResult<T> = Result<T, PlanError>;
