//! Configuration resolution for bslaunch.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/bslaunch/settings.json)
//! 3. Project config (.bslaunch/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Complete bslaunch configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceOptions,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Launcher service options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOptions {
    /// Start a BrowserStack Local tunnel before the run.
    #[serde(default)]
    pub browserstack_local: bool,
    /// Kill the tunnel by pid at the end of the run instead of stopping it
    /// gracefully.
    #[serde(default)]
    pub forced_stop: bool,
    /// Overrides merged over the base tunnel options.
    #[serde(default)]
    pub opts: Map<String, Value>,
}

/// Remote session configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    pub user: Option<String>,
    /// Access key, also used to authenticate the tunnel.
    pub key: Option<String>,
}

/// A single config file. Settings the file leaves out stay unset so they
/// never override a lower layer.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigOverlay {
    #[serde(default)]
    pub service: ServiceOverlay,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Service options as written in a config file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOverlay {
    pub browserstack_local: Option<bool>,
    pub forced_stop: Option<bool>,
    #[serde(default)]
    pub opts: Map<String, Value>,
}

/// Load configuration with hierarchical resolution.
///
/// `global_path` is usually [`global_config_path`] and `var` usually reads
/// the process environment. Missing files are skipped.
pub fn resolve_config(
    global_path: Option<&Path>,
    project_dir: Option<&Path>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path
        && global_path.exists()
    {
        debug!(path = %global_path.display(), "Loading global config");
        merge_config(&mut config, load_config_file(global_path)?);
    }

    if let Some(dir) = project_dir {
        let project_path = dir.join(".bslaunch").join("settings.json");
        if project_path.exists() {
            debug!(path = %project_path.display(), "Loading project config");
            merge_config(&mut config, load_config_file(&project_path)?);
        }
    }

    apply_env_overrides(&mut config, var);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bslaunch").join("settings.json"))
}

/// Read a single config file.
pub fn load_config_file(path: &Path) -> Result<ConfigOverlay> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply the settings `overlay` sets on top of `base`. Opts merge key by key.
pub fn merge_config(base: &mut Config, overlay: ConfigOverlay) {
    if let Some(local) = overlay.service.browserstack_local {
        base.service.browserstack_local = local;
    }
    if let Some(forced) = overlay.service.forced_stop {
        base.service.forced_stop = forced;
    }
    base.service.opts.extend(overlay.service.opts);

    if overlay.session.user.is_some() {
        base.session.user = overlay.session.user;
    }
    if overlay.session.key.is_some() {
        base.session.key = overlay.session.key;
    }
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("BROWSERSTACK_USERNAME") {
        config.session.user = Some(val);
    }
    if let Some(val) = var("BROWSERSTACK_ACCESS_KEY") {
        config.session.key = Some(val);
    }
    if let Some(flag) = var("BSLAUNCH_LOCAL").as_deref().and_then(parse_flag) {
        config.service.browserstack_local = flag;
    }
    if let Some(flag) = var("BSLAUNCH_FORCED_STOP").as_deref().and_then(parse_flag) {
        config.service.forced_stop = flag;
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
