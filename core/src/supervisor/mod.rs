//! Service supervisor implementation
//!
//! A [`ServiceSupervisor`] owns the transition of one service definition
//! between stopped and running:
//!
//! ```text
//! Stopped --start--> Running --stop--> Stopped
//!                       |
//!                       +--(process exits on its own)--> Stopped + SupervisorEvent::Exited
//! ```
//!
//! ## Components
//!
//! - [`ServiceSupervisor`]: control interface (`start`, `stop`, `toggle`, `status`)
//! - `watcher`: the per-run task that reaps the child and reports unsolicited exits
//!
//! ## Concurrency
//!
//! Operations on one supervisor are serialized by an async mutex around the
//! active run, so two concurrent `start` calls yield one success and one
//! [`CoreError::AlreadyRunning`]. The watcher publishes the exit on a per-run
//! channel *before* it takes that mutex, which lets `stop` hold the mutex
//! while it waits for the reap without deadlocking.
//!
//! `stop` has no timeout and never escalates to SIGKILL; a process that
//! ignores SIGTERM keeps `stop` waiting.

use crate::{process, CoreError, Result};
use nix::unistd::Pid;
use schema::{ServiceDefinition, ServiceExit, ServiceStatus, SupervisorEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, error, info, warn};

mod watcher;


use watcher::{ActiveRun, RunOutcome};

/// Capacity of the event channel created by [`ServiceSupervisor::standalone`]
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Supervisor for a single service definition
///
/// Cloning is cheap and every clone controls the same service.
#[derive(Debug, Clone)]
pub struct ServiceSupervisor {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    definition: ServiceDefinition,
    /// The live child, if any. Guarded so that operations are serialized.
    run: Mutex<Option<ActiveRun>>,
    status_tx: watch::Sender<ServiceStatus>,
    event_tx: broadcast::Sender<SupervisorEvent>,
    next_generation: AtomicU64,
}

impl ServiceSupervisor {
    /// Create a stopped supervisor that reports exits on `event_tx`
    pub fn new(definition: ServiceDefinition, event_tx: broadcast::Sender<SupervisorEvent>) -> Self {
        let (status_tx, _) = watch::channel(ServiceStatus::stopped());
        Self {
            inner: Arc::new(Inner {
                definition,
                run: Mutex::new(None),
                status_tx,
                event_tx,
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Create a supervisor with its own event channel
    pub fn standalone(definition: ServiceDefinition) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self::new(definition, event_tx)
    }

    /// The definition this supervisor runs
    pub fn definition(&self) -> &ServiceDefinition {
        &self.inner.definition
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.inner.definition.name
    }

    /// Current status
    pub fn status(&self) -> ServiceStatus {
        *self.inner.status_tx.borrow()
    }

    /// Follow status changes
    pub fn subscribe_status(&self) -> watch::Receiver<ServiceStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Receive exit notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Start the service
    ///
    /// Spawns `sh -c <command>` in the definition's working directory as the
    /// leader of a new process group and starts a watcher for it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyRunning`] if a child is alive; the pid is unchanged
    /// - [`CoreError::SpawnError`] if the process could not be created; the
    ///   service stays stopped
    pub async fn start(&self) -> Result<()> {
        let mut run = self.inner.run.lock().await;

        if let Some(active) = run.as_ref() {
            match active.outcome() {
                None => return Err(CoreError::AlreadyRunning(self.name().to_string())),
                Some(outcome) => {
                    // Exited, but the watcher has not recorded it yet
                    let active = run.take();
                    if let Some(active) = active {
                        self.inner.record_unsolicited_exit(active.pid, outcome);
                    }
                }
            }
        }

        let definition = &self.inner.definition;
        let child = process::spawn_shell(&definition.command, definition.work_dir_path())
            .map_err(|source| {
                error!("Failed to start service '{}': {}", definition.name, source);
                CoreError::SpawnError {
                    name: definition.name.clone(),
                    source,
                }
            })?;

        let pid = child.pid();
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (exit_tx, exit_rx) = watch::channel(None);
        let watcher = tokio::spawn(watcher::watch_child(
            Arc::clone(&self.inner),
            generation,
            child,
            exit_tx,
        ));

        *run = Some(ActiveRun {
            generation,
            pid,
            exit_rx,
            watcher,
        });
        self.inner.status_tx.send_replace(ServiceStatus::running(pid));
        info!("Started service '{}' (PID: {})", definition.name, pid);
        Ok(())
    }

    /// Stop the service
    ///
    /// Idempotent: stopping a stopped service succeeds without doing
    /// anything. Otherwise SIGTERM goes to the whole process group and the
    /// call returns once the leader has been reaped, so `status()` reads
    /// stopped as soon as this returns `Ok`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ProcessLookupError`] if the group could not be resolved
    ///   or signalled; the status is left unchanged
    /// - [`CoreError::WaitError`] if reaping failed; the supervisor no longer
    ///   holds a handle and reports stopped
    pub async fn stop(&self) -> Result<()> {
        self.stop_with(process::terminate_group).await
    }

    /// `stop` with the group signalling step supplied by the caller
    async fn stop_with<F>(&self, signal_group: F) -> Result<()>
    where
        F: FnOnce(u32) -> nix::Result<Pid>,
    {
        let mut run = self.inner.run.lock().await;

        let Some(active) = run.as_mut() else {
            debug!("Service '{}' is not running", self.name());
            return Ok(());
        };

        if let Some(outcome) = active.outcome() {
            let pid = active.pid;
            *run = None;
            self.inner.record_unsolicited_exit(pid, outcome);
            return Ok(());
        }

        let pid = active.pid;
        if let Err(source) = signal_group(pid) {
            error!(
                "Failed to signal process group of service '{}' (pid {}): {}",
                self.name(),
                pid,
                source
            );
            return Err(CoreError::ProcessLookupError {
                name: self.name().to_string(),
                pid,
                source,
            });
        }

        let reaped = active.wait_reaped().await;
        *run = None;
        self.inner.status_tx.send_replace(ServiceStatus::stopped());

        match reaped {
            Ok(exit) => {
                info!("Stopped service '{}' ({})", self.name(), exit);
                Ok(())
            }
            Err(reason) => {
                error!("Error waiting for service '{}' to stop: {}", self.name(), reason);
                Err(CoreError::WaitError {
                    name: self.name().to_string(),
                    reason,
                })
            }
        }
    }

    /// Stop the service if it is running, start it otherwise
    ///
    /// Not atomic with respect to concurrent operations on the same
    /// service; callers serialize toggles per service.
    pub async fn toggle(&self) -> Result<()> {
        if self.status().is_running() {
            self.stop().await
        } else {
            self.start().await
        }
    }
}

impl Inner {
    /// Record an exit nobody asked for: reset the status and notify
    fn record_unsolicited_exit(&self, pid: u32, outcome: RunOutcome) {
        self.status_tx.send_replace(ServiceStatus::stopped());

        let name = &self.definition.name;
        let exit = match outcome {
            Ok(exit) => {
                if exit.is_success() {
                    info!("Service '{}' exited ({})", name, exit);
                } else {
                    warn!("Service '{}' exited with error: {}", name, exit);
                }
                exit
            }
            Err(reason) => {
                warn!("Lost track of service '{}' (pid {}): {}", name, pid, reason);
                ServiceExit::new(pid, None, None)
            }
        };

        // No subscribers is fine
        let _ = self.event_tx.send(SupervisorEvent::exited(name.clone(), exit));
    }
}
