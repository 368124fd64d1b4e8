//! BrowserStackLocal binary driven in daemon mode.
//!
//! `BrowserStackLocal --daemon start ...` forks the tunnel into the
//! background and prints a single JSON line describing the outcome before
//! the foreground process exits. `--daemon stop` asks the running daemon
//! with the same identity to shut down.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use super::error::TunnelError;
use super::options::TunnelOptions;
use super::process::TunnelProcess;
use crate::signal;

/// Environment variable naming the BrowserStackLocal executable.
pub const BINARY_ENV: &str = "BROWSERSTACK_LOCAL_BINARY";

/// Executable looked up on `PATH` when nothing else is configured.
pub const DEFAULT_BINARY: &str = "BrowserStackLocal";

/// Reply printed by `--daemon start`.
#[derive(Debug, Deserialize)]
struct DaemonReply {
    state: String,
    pid: Option<u32>,
    #[serde(default)]
    message: Value,
}

impl DaemonReply {
    fn message(&self) -> String {
        match &self.message {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| self.message.to_string(), ToString::to_string),
            Value::Null => format!("state {}", self.state),
            other => other.to_string(),
        }
    }
}

/// Tunnel backed by the BrowserStackLocal executable.
#[derive(Debug, Default)]
pub struct LocalBinary {
    binary: Option<PathBuf>,
    pid: Option<u32>,
    identity: Vec<String>,
}

impl LocalBinary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `binary` unless the start options name one via `binarypath`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
            ..Self::default()
        }
    }

    fn resolve_binary(&self, options: &TunnelOptions) -> PathBuf {
        options
            .binary_path()
            .or_else(|| self.binary.clone())
            .or_else(|| std::env::var_os(BINARY_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY))
    }

    async fn run_daemon(
        binary: &Path,
        command: &str,
        args: &[String],
    ) -> Result<Output, TunnelError> {
        debug!(binary = %binary.display(), command, "Running tunnel binary");
        Command::new(binary)
            .arg("--daemon")
            .arg(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TunnelError::SpawnFailed {
                reason: format!("{}: {e}", binary.display()),
            })
    }
}

fn parse_reply(output: &Output) -> Result<DaemonReply, TunnelError> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with('{'));
    match line.map(serde_json::from_str::<DaemonReply>) {
        Some(Ok(reply)) => Ok(reply),
        _ if !output.status.success() => Err(exited(output)),
        Some(Err(e)) => Err(TunnelError::Protocol(format!("{e}: {}", stdout.trim()))),
        None => Err(TunnelError::Protocol(format!(
            "no JSON reply in output: {}",
            stdout.trim()
        ))),
    }
}

/// Pid of the daemon a start reply reports as connected. Without a pid the
/// tunnel could be neither tracked nor killed.
fn connected_pid(reply: &DaemonReply) -> Result<u32, TunnelError> {
    if !reply.state.eq_ignore_ascii_case("connected") {
        return Err(TunnelError::Disconnected {
            message: reply.message(),
        });
    }
    reply
        .pid
        .ok_or_else(|| TunnelError::Protocol("connected reply without pid".to_string()))
}

fn exited(output: &Output) -> TunnelError {
    TunnelError::Exited {
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

impl TunnelProcess for LocalBinary {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn is_running(&self) -> bool {
        self.pid.is_some_and(signal::is_alive)
    }

    async fn start(&mut self, options: &TunnelOptions) -> Result<(), TunnelError> {
        let binary = self.resolve_binary(options);
        self.binary = Some(binary.clone());
        self.identity = options.identity_args();

        let output = Self::run_daemon(&binary, "start", &options.to_args()).await?;
        let pid = connected_pid(&parse_reply(&output)?)?;

        self.pid = Some(pid);
        info!(pid, "BrowserStack Local daemon connected");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), TunnelError> {
        let Some(binary) = self.binary.clone() else {
            return Ok(());
        };
        let output = Self::run_daemon(&binary, "stop", &self.identity).await?;
        if !output.status.success() {
            return Err(exited(&output));
        }
        self.pid = None;
        Ok(())
    }
}
