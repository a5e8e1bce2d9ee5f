//! Per-run watcher task
//!
//! Every successful `start` spawns one watcher that owns the child handle,
//! waits for it to exit, publishes the outcome on the run's exit channel and
//! then, if the run is still the current one, records the exit as
//! unsolicited.

use super::Inner;
use crate::process::{self, ChildProcess};
use schema::ServiceExit;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Result of reaping a child: the exit, or why it could not be reaped
pub(super) type RunOutcome = std::result::Result<ServiceExit, String>;

/// A started child process and the watcher that reaps it
#[derive(Debug)]
pub(super) struct ActiveRun {
    /// Distinguishes this run from earlier and later ones
    pub(super) generation: u64,
    /// Group leader pid
    pub(super) pid: u32,
    /// Set once by the watcher when the child has been reaped
    pub(super) exit_rx: watch::Receiver<Option<RunOutcome>>,
    /// Handle of the watcher task
    pub(super) watcher: JoinHandle<()>,
}

impl ActiveRun {
    /// The outcome if the watcher has already reaped the child
    pub(super) fn outcome(&self) -> Option<RunOutcome> {
        self.exit_rx.borrow().clone()
    }

    /// Wait until the watcher has reaped the child
    pub(super) async fn wait_reaped(&mut self) -> RunOutcome {
        match self.exit_rx.wait_for(Option::is_some).await {
            Ok(seen) => (*seen)
                .clone()
                .unwrap_or_else(|| Err("exit not recorded".to_string())),
            Err(_) => {
                let reason = if self.watcher.is_finished() {
                    "watcher task ended without reaping the process"
                } else {
                    "exit channel closed"
                };
                Err(reason.to_string())
            }
        }
    }
}

/// Reap `child`, publish the outcome, and record it if nobody stopped the run
pub(super) async fn watch_child(
    inner: Arc<Inner>,
    generation: u64,
    mut child: ChildProcess,
    exit_tx: watch::Sender<Option<RunOutcome>>,
) {
    let pid = child.pid();
    let outcome = match child.wait().await {
        Ok(status) => Ok(process::exit_info(pid, status)),
        Err(e) => {
            error!(
                "Failed to wait for service '{}' (pid {}): {}",
                inner.definition.name, pid, e
            );
            Err(e.to_string())
        }
    };

    // Publish before locking: a concurrent stop holds the lock while waiting for this
    exit_tx.send_replace(Some(outcome.clone()));

    let mut run = inner.run.lock().await;
    let current = run
        .as_ref()
        .is_some_and(|active| active.generation == generation);
    if current {
        *run = None;
        inner.record_unsolicited_exit(pid, outcome);
    } else {
        debug!(
            "Exit of pid {} for service '{}' already handled",
            pid, inner.definition.name
        );
    }
}
