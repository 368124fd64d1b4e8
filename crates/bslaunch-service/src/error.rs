//! Launcher error types.

use std::time::Duration;

use crate::tunnel::TunnelError;

/// Errors surfaced by the launcher lifecycle hooks.
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    /// Capabilities had a shape the tunnel marker cannot be applied to.
    /// Raised before any tunnel process is started.
    #[error(transparent)]
    InvalidCapabilities(bslaunch_core::Error),

    #[error("BrowserStack Local failed to start within {} seconds", .timeout.as_secs())]
    StartTimeout { timeout: Duration },

    #[error("BrowserStack Local failed to start: {0}")]
    Start(#[source] TunnelError),

    #[error("BrowserStack Local failed to stop within {} seconds", .timeout.as_secs())]
    StopTimeout { timeout: Duration },

    #[error("BrowserStack Local failed to stop: {0}")]
    Stop(#[source] TunnelError),
}
