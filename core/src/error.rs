//! Core error types and utilities

use thiserror::Error;

/// Core-specific error types
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// `start` was called while the service already has a live process
    #[error("Service '{0}' is already running")]
    AlreadyRunning(String),

    /// Creating the child process failed; the service stays stopped
    #[error("Failed to start service '{name}': {source}")]
    SpawnError {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The recorded pid no longer resolves to a process group that can be signalled
    #[error("Failed to signal process group of service '{name}' (pid {pid}): {source}")]
    ProcessLookupError {
        name: String,
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },

    /// Reaping the signalled process failed; re-query the status
    #[error("Error waiting for service '{name}' to stop: {reason}")]
    WaitError { name: String, reason: String },

    #[error("Service '{0}' not found")]
    ServiceNotFound(String),

    #[error("Service '{0}' already exists")]
    DuplicateService(String),
}

impl CoreError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::ConfigurationError(_) => "CORE001",
            CoreError::ValidationError(_) => "CORE002",
            CoreError::InitializationError(_) => "CORE003",
            CoreError::IoError(_) => "CORE005",
            CoreError::SerializationError(_) => "CORE006",
            CoreError::AlreadyRunning(_) => "CORE101",
            CoreError::SpawnError { .. } => "CORE102",
            CoreError::ProcessLookupError { .. } => "CORE103",
            CoreError::WaitError { .. } => "CORE104",
            CoreError::ServiceNotFound(_) => "CORE105",
            CoreError::DuplicateService(_) => "CORE106",
        }
    }
}

/// Core-specific result type
pub type Result<T> = std::result::Result<T, CoreError>;
