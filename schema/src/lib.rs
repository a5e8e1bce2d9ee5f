//! Schema definitions for traymux
//!
//! Shared data structures used by the supervisor core and the front ends:
//! the persisted [`ServiceDefinition`], the transient [`ServiceStatus`]
//! owned by the supervisor, and the [`SupervisorEvent`] notifications
//! emitted when a service exits on its own.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub mod events;
pub mod service;


pub use events::SupervisorEvent;
pub use service::{ServiceDefinition, ServiceExit, ServiceStatus};

/// On-disk services file: the ordered list of service definitions
///
/// Order is display order only; it carries no other meaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServicesFile {
    /// Configured services
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
}

impl ServicesFile {
    /// Find a definition by name
    pub fn find(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Position of a definition by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.services.iter().position(|s| s.name == name)
    }
}

/// Current time as an RFC3339 string with seconds precision
#[must_use]
pub fn current_timestamp() -> String {
    humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
}
