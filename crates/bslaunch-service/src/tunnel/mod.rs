//! BrowserStack Local tunnel processes.
//!
//! Provides the process capability the launcher drives, the options it is
//! started with, and the implementation backed by the real binary.

pub mod binary;
pub mod error;
pub mod options;
pub mod process;

pub use binary::LocalBinary;
pub use error::TunnelError;
pub use options::TunnelOptions;
pub use process::TunnelProcess;
