//! Application-level errors (source loading and settings)

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning external sources into configuration trees.
///
/// The tree itself never fails; these only come from reading and parsing.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("parse {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("unsupported config format (expected .json or .toml): {0}")]
    UnsupportedFormat(PathBuf),

    #[error("environment error: {message}")]
    Environment { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
