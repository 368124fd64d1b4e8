//! bslaunch Service Library
//!
//! Lifecycle management for a BrowserStack Local tunnel around a test run:
//! - Tunnel process capability and the BrowserStackLocal binary driver
//! - Deadline-bounded start and stop
//! - Capability annotation and forced shutdown by pid

pub mod error;
pub mod launcher;
pub mod signal;
pub mod timeout;
pub mod tunnel;

pub use error::LauncherError;
pub use launcher::LauncherService;
pub use timeout::TUNNEL_TIMEOUT;
