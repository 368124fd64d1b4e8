//! BrowserStack Local launcher lifecycle.
//!
//! `on_prepare` runs once before any remote session starts and brings the
//! tunnel up; `on_complete` runs once after every session has finished and
//! tears it down. Both tunnel operations are bounded by [`TUNNEL_TIMEOUT`].

use std::io;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use bslaunch_core::config::{ServiceOptions, SessionConfig};
use bslaunch_core::mark_local;

use crate::error::LauncherError;
use crate::signal;
use crate::timeout::{Phase, TUNNEL_TIMEOUT, race};
use crate::tunnel::{LocalBinary, TunnelOptions, TunnelProcess};

/// Terminates a process by pid.
pub type KillFn = Arc<dyn Fn(u32) -> io::Result<()> + Send + Sync>;

type TunnelFactory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Owns at most one tunnel for the duration of a test run.
pub struct LauncherService<T> {
    options: ServiceOptions,
    session: SessionConfig,
    factory: TunnelFactory<T>,
    kill: KillFn,
    tunnel: Option<T>,
    boot_time: Option<Duration>,
}

impl LauncherService<LocalBinary> {
    /// Launcher driving the BrowserStackLocal binary.
    pub fn new(options: ServiceOptions, session: SessionConfig) -> Self {
        Self::with_factory(options, session, LocalBinary::new)
    }
}

impl<T: TunnelProcess> LauncherService<T> {
    /// Launcher constructing its tunnel through `factory`.
    pub fn with_factory(
        options: ServiceOptions,
        session: SessionConfig,
        factory: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            options,
            session,
            factory: Box::new(factory),
            kill: Arc::new(signal::kill_pid),
            tunnel: None,
            boot_time: None,
        }
    }

    /// Replace the kill-by-pid used for forced stops.
    #[must_use]
    pub fn with_kill(
        mut self,
        kill: impl Fn(u32) -> io::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.kill = Arc::new(kill);
        self
    }

    pub const fn tunnel(&self) -> Option<&T> {
        self.tunnel.as_ref()
    }

    /// Time the tunnel took to come up, once it has.
    pub const fn boot_time(&self) -> Option<Duration> {
        self.boot_time
    }

    /// Start the tunnel and mark `capabilities` as local.
    ///
    /// `session` overrides the session config the launcher was built with.
    /// Capabilities must be a JSON object or an array of objects; anything
    /// else is rejected before the tunnel is started.
    pub async fn on_prepare(
        &mut self,
        session: Option<&SessionConfig>,
        capabilities: Option<&mut Value>,
    ) -> Result<(), LauncherError> {
        if !self.options.browserstack_local {
            info!("browserstackLocal is not enabled - skipping...");
            return Ok(());
        }

        let session = session.unwrap_or(&self.session);
        let opts = TunnelOptions::build(session.key.as_deref(), &self.options.opts);
        let tunnel = self.tunnel.insert((self.factory)());

        let marked = mark_local(capabilities).map_err(LauncherError::InvalidCapabilities)?;
        debug!(descriptors = marked, "Capabilities marked for local testing");

        let started = Instant::now();
        race(Phase::Start, TUNNEL_TIMEOUT, tunnel.start(&opts)).await?;
        let boot_time = started.elapsed();

        info!(
            boot_ms = boot_time.as_millis(),
            pid = ?tunnel.pid(),
            "BrowserStack Local successfully started after {}ms",
            boot_time.as_millis()
        );
        self.boot_time = Some(boot_time);
        Ok(())
    }

    /// Stop the tunnel if one was started and is still running.
    ///
    /// With `forced_stop` the process is killed by pid and the graceful stop
    /// is skipped. A failed graceful stop is returned as is; it never falls
    /// back to a kill.
    pub async fn on_complete(&mut self) -> Result<(), LauncherError> {
        let Some(tunnel) = self.tunnel.as_mut() else {
            debug!("No tunnel was started");
            return Ok(());
        };
        if !tunnel.is_running() {
            debug!("Tunnel is not running");
            return Ok(());
        }

        if self.options.forced_stop {
            match tunnel.pid() {
                Some(pid) => {
                    info!(pid, "Killing BrowserStack Local");
                    if let Err(e) = (self.kill)(pid) {
                        warn!(pid, error = %e, "Failed to kill BrowserStack Local");
                    }
                }
                None => warn!("BrowserStack Local is running without a known pid"),
            }
            return Ok(());
        }

        race(Phase::Stop, TUNNEL_TIMEOUT, tunnel.stop()).await?;
        info!("BrowserStack Local stopped");
        Ok(())
    }
}
