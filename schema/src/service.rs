//! Service definition and runtime status types
//!
//! A [`ServiceDefinition`] is what the user configures and what gets
//! persisted. A [`ServiceStatus`] is the transient `running`/`pid` pair the
//! supervisor maintains for a definition; it is never written to disk.
//!
//! ## Lifecycle
//!
//! - `Stopped`: no child process group exists for the service (`pid == 0`)
//! - `Running`: the supervisor holds a live handle to the group leader

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A named shell command the supervisor can start and stop
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    /// Unique name, used as the lookup key
    pub name: String,

    /// Working directory of the child process; empty inherits ours
    #[serde(default)]
    pub work_dir: String,

    /// Command line executed through `sh -c`
    pub command: String,
}

impl ServiceDefinition {
    /// Create a new definition
    pub fn new(
        name: impl Into<String>,
        work_dir: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            work_dir: work_dir.into(),
            command: command.into(),
        }
    }

    /// Working directory to spawn in, `None` when unset
    pub fn work_dir_path(&self) -> Option<&Path> {
        if self.work_dir.trim().is_empty() {
            None
        } else {
            Some(Path::new(&self.work_dir))
        }
    }
}

/// Transient run state of a service
///
/// Only constructible through [`ServiceStatus::stopped`] and
/// [`ServiceStatus::running`], so `is_running() == (pid() != 0)` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    running: bool,
    pid: u32,
}

impl ServiceStatus {
    /// The stopped status (`running == false`, `pid == 0`)
    #[must_use]
    pub const fn stopped() -> Self {
        Self {
            running: false,
            pid: 0,
        }
    }

    /// A running status for the given group leader pid.
    ///
    /// A pid of 0 cannot denote a live process and yields the stopped status.
    #[must_use]
    pub const fn running(pid: u32) -> Self {
        Self {
            running: pid != 0,
            pid,
        }
    }

    /// Whether a child process group is alive
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Pid of the group leader, 0 when stopped
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Menu label for a service in this state, e.g. `web (Running)`
    pub fn label(&self, name: &str) -> String {
        format!("{name} ({self})")
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.running {
            f.write_str("Running")
        } else {
            f.write_str("Stopped")
        }
    }
}

/// Information about how a service process exited
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceExit {
    /// Pid of the process group leader that exited
    pub pid: u32,

    /// Exit code (None if killed by signal)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Signal that killed the process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,

    /// When the exit was observed (RFC3339)
    pub timestamp: String,
}

impl ServiceExit {
    /// Exit observed now
    pub fn new(pid: u32, exit_code: Option<i32>, signal: Option<i32>) -> Self {
        Self {
            pid,
            exit_code,
            signal,
            timestamp: crate::current_timestamp(),
        }
    }

    /// Exit code 0
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Non-zero exit code or death by signal
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for ServiceExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.exit_code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "signal {signal}"),
            (None, None) => f.write_str("unknown status"),
        }
    }
}
