//! Unix process management with safe spawn/kill using process groups
//!
//! Every service command is run as `sh -c <command>` in a fresh session
//! created with `setsid()`. The shell therefore becomes the leader of a new
//! process group whose id equals its pid, and anything it forks (pipeline
//! stages, `&` jobs, grandchildren) inherits that group unless it moves
//! itself elsewhere.
//!
//! ## Process Groups
//!
//! When a process calls `setsid()`, it:
//! - Creates a new session and becomes the session leader
//! - Creates a new process group and becomes the process group leader
//! - Has no controlling terminal
//!
//! Signalling the group (`killpg`, i.e. `kill(-pgid, sig)`) reaches every
//! member at once, which is how a service is stopped without leaving orphans.

// Allow unsafe code for this module since process management requires libc::setsid() calls
#![allow(unsafe_code)]

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::{getpgid, Pid};
use schema::ServiceExit;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tracing::{debug, error};

/// Shell used to interpret service command lines
pub const SHELL: &str = "/bin/sh";

/// A child process that leads its own process group
#[derive(Debug)]
pub struct ChildProcess {
    /// The process ID of the spawned process
    pid: Pid,
    /// The underlying Child handle for waiting and status checking
    child: Child,
}

impl ChildProcess {
    /// Get the process ID
    pub fn pid(&self) -> u32 {
        self.pid.as_raw().unsigned_abs()
    }

    /// Get the process group ID (same as PID for session leaders)
    pub fn pgid(&self) -> u32 {
        self.pid()
    }

    /// Wait for the process to exit and reap it
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }
}

/// Spawn `sh -c <command>` as the leader of a new process group
///
/// The child's standard streams are attached to `/dev/null`. When
/// `work_dir` is `Some`, the child starts there; a directory that does not
/// exist makes the spawn itself fail.
///
/// ## Safety
///
/// The `pre_exec` closure only calls `setsid()`, which is async-signal-safe
/// and therefore fine to run between `fork()` and `exec()`.
///
/// ## Example
///
/// ```rust,no_run
/// # async fn demo() -> std::io::Result<()> {
/// use traymux_core::process::unix::spawn_shell;
///
/// let mut child = spawn_shell("sleep 1 | cat", None)?;
/// println!("group leader: {}", child.pid());
/// child.wait().await?;
/// # Ok(())
/// # }
/// ```
pub fn spawn_shell(command: &str, work_dir: Option<&Path>) -> io::Result<ChildProcess> {
    debug!("Spawning {} -c {:?} in {:?}", SHELL, command, work_dir);

    let mut cmd = Command::new(SHELL);
    cmd.arg("-c").arg(command);
    if let Some(dir) = work_dir {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    // Safety: setsid() is async-signal-safe and appropriate for use in pre_exec
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let child = cmd.spawn().map_err(|e| {
        error!("Failed to spawn {:?}: {}", command, e);
        e
    })?;

    let raw_pid = child
        .id()
        .ok_or_else(|| io::Error::other("spawned child did not have a PID"))?;
    let pid = Pid::from_raw(
        i32::try_from(raw_pid).map_err(|_| io::Error::other("PID out of range"))?,
    );
    debug!("Spawned process {} in new process group", pid);

    Ok(ChildProcess { pid, child })
}

fn to_pid(pid: u32) -> nix::Result<Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|raw| *raw > 0)
        .map(Pid::from_raw)
        .ok_or(Errno::EINVAL)
}

/// Resolve the process group of a live (or not yet reaped) process
pub fn process_group_of(pid: u32) -> nix::Result<Pid> {
    getpgid(Some(to_pid(pid)?))
}

/// Send SIGTERM to the whole process group that `pid` belongs to
///
/// Returns the group id that was signalled. Unlike a plain `kill(pid)`, this
/// reaches every descendant still in the group. Fails with `ESRCH` when the
/// pid no longer names a process.
pub fn terminate_group(pid: u32) -> nix::Result<Pid> {
    let pgid = process_group_of(pid)?;
    debug!("Sending SIGTERM to process group {} (leader {})", pgid, pid);
    killpg(pgid, Signal::SIGTERM)?;
    Ok(pgid)
}

/// Whether any process (zombies included) is still a member of the group
pub fn group_exists(pgid: u32) -> bool {
    match to_pid(pgid) {
        Ok(pgid) => matches!(killpg(pgid, None), Ok(()) | Err(Errno::EPERM)),
        Err(_) => false,
    }
}

/// Convert an exit status into the schema's exit record
pub fn exit_info(pid: u32, status: ExitStatus) -> ServiceExit {
    ServiceExit::new(pid, status.code(), status.signal())
}
