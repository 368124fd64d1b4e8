//! Error types for the `bslaunch` core library.

use thiserror::Error;

/// Result type alias using the core `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `bslaunch` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Capability input was neither a mapping nor a sequence of mappings
    #[error("Capabilities should be an object or array of objects, got {found}")]
    CapabilityShape { found: &'static str },
}
