//! Core functionality for traymux
//!
//! This crate contains the process lifecycle supervisor and the pieces a
//! front end needs around it: the ordered service registry, JSON config
//! persistence and tracing setup.

pub mod config;
pub mod error;
#[cfg(unix)]
pub mod process;
#[cfg(unix)]
pub mod registry;
#[cfg(unix)]
pub mod supervisor;


// Re-export schema types for convenience
pub use schema::*;

pub use error::{CoreError, Result};
#[cfg(unix)]
pub use registry::ServiceRegistry;
#[cfg(unix)]
pub use supervisor::ServiceSupervisor;

/// Core utilities and helper functions
pub mod utils {
    use tracing::info;

    /// Initialize tracing for the application
    ///
    /// `RUST_LOG` takes precedence over `level` when set.
    pub fn init_tracing(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| crate::CoreError::InitializationError(e.to_string()))?;

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| crate::CoreError::InitializationError(e.to_string()))?;

        info!("Tracing initialized with level: {}", level);
        Ok(())
    }
}
