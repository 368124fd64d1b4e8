//! The tunnel process capability driven by the launcher.

use std::future::Future;

use super::error::TunnelError;
use super::options::TunnelOptions;

/// An external tunnel process.
///
/// Implementations are opaque to the launcher: it only starts them, asks
/// whether they are still up, and stops them. Neither `start` nor `stop`
/// needs to support cancellation; the launcher bounds both with a deadline
/// and simply stops polling the loser.
pub trait TunnelProcess: Send {
    /// OS process id, known once the tunnel is running.
    fn pid(&self) -> Option<u32>;

    fn is_running(&self) -> bool;

    fn start(
        &mut self,
        options: &TunnelOptions,
    ) -> impl Future<Output = Result<(), TunnelError>> + Send;

    fn stop(&mut self) -> impl Future<Output = Result<(), TunnelError>> + Send;
}
