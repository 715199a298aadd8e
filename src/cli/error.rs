//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("{count} leaf/branch conflict(s) skipped during merge")]
    Conflicts { count: usize },

    #[error("cannot render as {format}: {message}")]
    Render { format: String, message: String },
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::PathNotFound(_) => crate::exitcode::NOINPUT,
            CliError::Conflicts { .. } | CliError::Render { .. } => crate::exitcode::DATAERR,
            CliError::Application(e) => match e {
                ApplicationError::Parse { .. } | ApplicationError::UnsupportedFormat(_) => {
                    crate::exitcode::DATAERR
                }
                ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                ApplicationError::Config { .. } | ApplicationError::Environment { .. } => {
                    crate::exitcode::CONFIG
                }
            },
        }
    }
}
