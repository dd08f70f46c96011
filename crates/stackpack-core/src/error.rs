//! Configuration error types.
//!
//! Every variant here is fatal: the planner refuses to start when one is
//! raised. Recoverable reference problems are diagnostics, not errors.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort a planning run before any partitioning begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be at least 1, got {value}")]
    NonPositiveCapacity { name: &'static str, value: i64 },

    #[error("duplicate resource id: {0}")]
    DuplicateId(String),

    #[error("resource id {id} contains reserved separator '{separator}'")]
    ReservedSeparator { id: String, separator: char },

    #[error("resource {0} declares a cost of 0")]
    ZeroCost(String),

    #[error("manifest is missing a version key")]
    MissingVersion,

    #[error("unknown manifest version: {0}")]
    UnknownVersion(String),

    #[error("unsupported manifest format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to parse TOML manifest: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
}
