//! Events emitted by the supervisor
//!
//! The supervisor publishes an event whenever a service's status changes
//! without the caller asking for it, i.e. when the child process exits on
//! its own. Front ends subscribe to these to refresh their labels instead
//! of polling.

use crate::service::ServiceExit;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Notifications broadcast by the supervisor
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum SupervisorEvent {
    /// The service's process exited without a stop request; it is now stopped
    Exited {
        /// Service name
        name: String,
        /// Exit information
        exit: ServiceExit,
    },
}

impl SupervisorEvent {
    /// Create an exited event
    #[must_use]
    pub fn exited(name: impl Into<String>, exit: ServiceExit) -> Self {
        Self::Exited {
            name: name.into(),
            exit,
        }
    }

    /// Name of the service this event is about
    pub fn service_name(&self) -> &str {
        match self {
            Self::Exited { name, .. } => name,
        }
    }
}
