//! CLI error types

use thiserror::Error;
use traymux_core::CoreError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown menu command: {0}")]
    UnknownCommand(String),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CliError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            CliError::InvalidArgument(_) => "CLI002",
            CliError::UnknownCommand(_) => "CLI003",
            CliError::Core(e) => e.code(),
            CliError::IoError(_) => "CLI008",
        }
    }
}

/// CLI-specific result type
pub type Result<T> = std::result::Result<T, CliError>;
