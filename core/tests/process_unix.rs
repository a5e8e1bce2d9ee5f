//! Integration tests for Unix process-group management
//!
//! These tests verify that the process layer:
//! - Creates processes in their own process groups (via setsid)
//! - Terminates entire process groups with one signal
//! - Reports lookups of vanished processes as errors

#![cfg(target_os = "linux")]

mod common;

use common::{live_group_members, read_pid_file, run_with_default_timeout};
use nix::errno::Errno;
use std::time::Duration;
use traymux_core::process::unix::{group_exists, process_group_of, spawn_shell, terminate_group};

/// Background jobs of the shell stay in the leader's group
#[tokio::test]
async fn test_background_jobs_share_the_group() {
    run_with_default_timeout(async {
        let dir = tempfile::tempdir().unwrap();
        let mut child = spawn_shell("sleep 30 & echo $! > bg.pid; wait", Some(dir.path()))
            .expect("spawn shell");
        let bg = read_pid_file(&dir.path().join("bg.pid")).await;

        let pgid = child.pgid();
        assert_eq!(process_group_of(bg).unwrap().as_raw() as u32, pgid);
        let mut members = live_group_members(pgid);
        members.sort_unstable();
        assert!(members.contains(&child.pid()));
        assert!(members.contains(&bg));

        terminate_group(child.pid()).expect("SIGTERM group");
        child.wait().await.expect("reap leader");
        assert!(
            common::eventually(Duration::from_secs(5), || live_group_members(pgid).is_empty())
                .await,
            "group {pgid} still has live members"
        );
    })
    .await;
}

/// Once the leader is reaped its pid no longer resolves
#[tokio::test]
async fn test_lookup_after_reap_fails() {
    let mut child = spawn_shell("exit 0", None).expect("spawn");
    let pid = child.pid();
    assert!(child.wait().await.unwrap().success());

    assert_eq!(terminate_group(pid), Err(Errno::ESRCH));
    assert!(!group_exists(pid));
}

/// Two services never share a group
#[tokio::test]
async fn test_multiple_processes() {
    let mut first = spawn_shell("sleep 5", None).expect("spawn first");
    let mut second = spawn_shell("sleep 5", None).expect("spawn second");

    assert_ne!(first.pid(), second.pid());
    assert_ne!(first.pgid(), second.pgid());
    assert!(group_exists(first.pgid()));
    assert!(group_exists(second.pgid()));

    terminate_group(first.pid()).unwrap();
    terminate_group(second.pid()).unwrap();
    first.wait().await.unwrap();
    second.wait().await.unwrap();
}
