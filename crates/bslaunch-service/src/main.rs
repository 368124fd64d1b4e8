//! `bslaunch`
//!
//! Wraps a test command with a BrowserStack Local tunnel: the tunnel is
//! started and the capabilities annotated before the command runs, and the
//! tunnel is torn down after it exits.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing::{error, info, warn};

use bslaunch_core::config::{self, Config, load_config_file, merge_config};
use bslaunch_service::LauncherService;

#[derive(Parser, Debug)]
#[command(name = "bslaunch")]
#[command(version, about = "Run a test command behind a BrowserStack Local tunnel")]
struct Args {
    /// Project directory searched for `.bslaunch/settings.json`
    #[arg(long, env = "BSLAUNCH_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Extra config file applied over global and project config
    #[arg(long, short = 'c', env = "BSLAUNCH_CONFIG")]
    config: Option<PathBuf>,

    /// Start the tunnel even if config leaves it disabled
    #[arg(long)]
    local: bool,

    /// Kill the tunnel by pid instead of stopping it gracefully
    #[arg(long)]
    forced_stop: bool,

    /// Access key used to authenticate the tunnel
    #[arg(long)]
    key: Option<String>,

    /// Tunnel option override as NAME=VALUE (VALUE parsed as JSON when possible)
    #[arg(long = "opt", value_name = "NAME=VALUE", value_parser = parse_opt)]
    opts: Vec<(String, Value)>,

    /// Capabilities JSON file (object or array of objects) to annotate
    #[arg(long)]
    capabilities: Option<PathBuf>,

    /// Where to write annotated capabilities (defaults to rewriting the input)
    #[arg(long, requires = "capabilities")]
    capabilities_out: Option<PathBuf>,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "BSLAUNCH_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "BSLAUNCH_LOG_JSON")]
    log_json: bool,

    /// Test command to run; without one the tunnel is held until Ctrl-C
    #[arg(last = true)]
    command: Vec<String>,
}

fn parse_opt(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    if name.is_empty() {
        return Err(format!("empty option name in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((name.to_string(), value))
}

fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    resolve_config_with(args, config::global_config_path().as_deref(), |name| {
        std::env::var(name).ok()
    })
}

/// Files first (global, project, `--config`), then the environment, then
/// command-line flags.
fn resolve_config_with(
    args: &Args,
    global_path: Option<&Path>,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Config> {
    let project_dir = match &args.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let mut config = config::resolve_config(global_path, Some(&project_dir), var)?;

    if let Some(path) = &args.config {
        merge_config(&mut config, load_config_file(path)?);
    }

    config.service.browserstack_local |= args.local;
    config.service.forced_stop |= args.forced_stop;
    if let Some(key) = &args.key {
        config.session.key = Some(key.clone());
    }
    config.service.opts.extend(args.opts.iter().cloned());
    Ok(config)
}

fn read_capabilities(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read capabilities {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse capabilities {}", path.display()))
}

fn write_capabilities(path: &Path, capabilities: &Value) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(capabilities)?;
    std::fs::write(path, raw)
        .with_context(|| format!("Failed to write capabilities {}", path.display()))
}

async fn run_command(
    command: &[String],
    local: bool,
    identifier: Option<&Value>,
) -> anyhow::Result<ExitCode> {
    let Some((program, rest)) = command.split_first() else {
        info!("No command given, holding tunnel until Ctrl-C");
        tokio::signal::ctrl_c().await?;
        return Ok(ExitCode::SUCCESS);
    };

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(rest);
    if local {
        cmd.env("BROWSERSTACK_LOCAL", "true");
        if let Some(id) = identifier.and_then(Value::as_str) {
            cmd.env("BROWSERSTACK_LOCAL_IDENTIFIER", id);
        }
    }

    info!(program = %program, "Running test command");
    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to run {program}"))?;

    // The child shares our process group and sees Ctrl-C itself; keep the
    // signal from killing us before the tunnel is torn down.
    let status = tokio::select! {
        status = child.wait() => status,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, waiting for test command to exit");
            child.wait().await
        }
    }?;
    info!(?status, "Test command finished");
    Ok(status
        .code()
        .and_then(|c| u8::try_from(c).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    bslaunch_core::tracing_init::init_tracing(&args.log_level, args.log_json);

    let config = resolve_config(&args)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        local = config.service.browserstack_local,
        forced_stop = config.service.forced_stop,
        "Starting bslaunch"
    );

    let mut capabilities = match &args.capabilities {
        Some(path) => read_capabilities(path)?,
        None => Value::Object(serde_json::Map::new()),
    };

    let identifier = config.service.opts.get("localIdentifier").cloned();
    let mut launcher = LauncherService::new(config.service, config.session);

    if let Err(e) = launcher.on_prepare(None, Some(&mut capabilities)).await {
        error!(error = %e, "Failed to prepare BrowserStack Local");
        if let Err(stop_err) = launcher.on_complete().await {
            error!(error = %stop_err, "Failed to clean up BrowserStack Local");
        }
        return Err(e.into());
    }

    if let Some(path) = args.capabilities_out.as_ref().or(args.capabilities.as_ref()) {
        write_capabilities(path, &capabilities)?;
    }

    let local = launcher.tunnel().is_some();
    let outcome = run_command(&args.command, local, identifier.as_ref()).await;

    launcher.on_complete().await?;
    outcome
}
