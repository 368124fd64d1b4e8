#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::panic)] // Integration tests use unwrap for brevity

//! Integration tests for the BrowserStackLocal binary driver.
//!
//! A shell script stands in for the real binary: it answers `--daemon start`
//! with the JSON reply the binary prints and backgrounds a `sleep` as the
//! tunnel daemon.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, json};
use tempfile::TempDir;

use bslaunch_core::config::{ServiceOptions, SessionConfig};
use bslaunch_service::tunnel::{LocalBinary, TunnelError, TunnelOptions, TunnelProcess};
use bslaunch_service::{LauncherError, LauncherService};

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("BrowserStackLocal");
    let script = format!(
        "#!/bin/sh\nstate_dir='{}'\necho \"$@\" >> \"$state_dir/invocations\"\n{body}\n",
        dir.display()
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn connecting_binary(dir: &Path) -> PathBuf {
    write_script(
        dir,
        r#"case "$2" in
  start)
    sleep 300 >/dev/null 2>&1 &
    echo $! > "$state_dir/pid"
    printf '{"state":"connected","pid":%s,"message":{"message":"Connected"}}\n' "$!"
    ;;
  stop)
    kill "$(cat "$state_dir/pid")"
    printf '{"status":"success","message":"BrowserStackLocal stopped successfully"}\n'
    ;;
esac"#,
    )
}

fn invocations(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("invocations"))
        .unwrap()
        .lines()
        .map(ToString::to_string)
        .collect()
}

fn daemon_pid(dir: &Path) -> u32 {
    std::fs::read_to_string(dir.join("pid"))
        .unwrap()
        .trim()
        .parse()
        .unwrap()
}

fn options(key: &str) -> TunnelOptions {
    let mut overrides = Map::new();
    overrides.insert("localIdentifier".into(), json!("ci-1"));
    TunnelOptions::build(Some(key), &overrides)
}

#[tokio::test]
async fn start_and_stop_drive_daemon_mode() {
    let dir = TempDir::new().unwrap();
    let binary = connecting_binary(dir.path());
    let mut tunnel = LocalBinary::with_binary(&binary);

    tunnel.start(&options("s3cret")).await.unwrap();

    let pid = daemon_pid(dir.path());
    assert_eq!(tunnel.pid(), Some(pid));
    assert!(tunnel.is_running());

    tunnel.stop().await.unwrap();

    assert!(tunnel.pid().is_none());
    assert!(!tunnel.is_running());
    assert_eq!(
        invocations(dir.path()),
        [
            "--daemon start --key s3cret --force-local --only-automate --local-identifier ci-1",
            "--daemon stop --key s3cret --local-identifier ci-1",
        ]
    );
}

#[tokio::test]
async fn disconnected_reply_fails_start() {
    let dir = TempDir::new().unwrap();
    let binary = write_script(
        dir.path(),
        r#"printf '{"state":"disconnected","message":{"message":"Authentication Failure"}}\n'"#,
    );
    let mut tunnel = LocalBinary::with_binary(&binary);

    let err = tunnel.start(&options("wrong")).await.unwrap_err();

    assert_eq!(
        err,
        TunnelError::Disconnected {
            message: "Authentication Failure".into()
        }
    );
    assert!(!tunnel.is_running());
}

#[tokio::test]
async fn connected_reply_without_pid_fails_start() {
    let dir = TempDir::new().unwrap();
    let binary = write_script(
        dir.path(),
        r#"printf '{"state":"connected","message":{"message":"Connected"}}\n'"#,
    );
    let mut tunnel = LocalBinary::with_binary(&binary);

    let err = tunnel.start(&options("s3cret")).await.unwrap_err();

    assert!(matches!(err, TunnelError::Protocol(_)), "{err}");
    assert!(tunnel.pid().is_none());
    assert!(!tunnel.is_running());
}

#[tokio::test]
async fn launcher_forced_stop_kills_daemon_pid() {
    let dir = TempDir::new().unwrap();
    let binary = connecting_binary(dir.path());
    let killed = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&killed);

    let options = ServiceOptions {
        browserstack_local: true,
        forced_stop: true,
        opts: Map::new(),
    };
    let session = SessionConfig {
        user: None,
        key: Some("s3cret".into()),
    };
    let mut launcher =
        LauncherService::with_factory(options, session, move || LocalBinary::with_binary(&binary))
            .with_kill(move |pid| {
                recorded.lock().unwrap().push(pid);
                bslaunch_service::signal::kill_pid(pid)
            });
    let mut caps = json!([{"browserName": "chrome"}]);

    launcher.on_prepare(None, Some(&mut caps)).await.unwrap();
    assert!(launcher.boot_time().is_some());
    launcher.on_complete().await.unwrap();

    assert_eq!(*killed.lock().unwrap(), [daemon_pid(dir.path())]);
    // Only the start went through the binary; the kill bypassed `--daemon stop`.
    assert_eq!(invocations(dir.path()).len(), 1);
}

#[tokio::test]
async fn launcher_surfaces_missing_binary_as_start_failure() {
    let options = ServiceOptions {
        browserstack_local: true,
        forced_stop: false,
        opts: Map::new(),
    };
    let mut launcher = LauncherService::with_factory(options, SessionConfig::default(), || {
        LocalBinary::with_binary("/nonexistent/BrowserStackLocal")
    });
    let mut caps = json!({});

    let err = launcher.on_prepare(None, Some(&mut caps)).await.unwrap_err();

    assert!(
        matches!(err, LauncherError::Start(TunnelError::SpawnFailed { .. })),
        "{err}"
    );
    // Nothing is running, so completion is a no-op.
    launcher.on_complete().await.unwrap();
}
