//! Process management for the traymux core library
//!
//! Services are shell command lines, so a single service can be a whole tree
//! of processes (pipelines, backgrounded jobs). Every service is therefore
//! spawned as the leader of its own process group, and stopping it signals
//! the group rather than the leader alone.
//!
//! ## Platform Support
//!
//! - **Unix**: process groups via `setsid()` and `killpg()`

#[cfg(unix)]
pub mod unix;

#[cfg(unix)]
pub use unix::*;
