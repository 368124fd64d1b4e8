//! `bslaunch` Core Library
//!
//! Shared functionality for the BrowserStack Local launcher:
//! - Configuration resolution and hierarchy
//! - Capability descriptor annotation
//! - Tracing initialisation
//! - Common error types

pub mod capabilities;
pub mod config;
pub mod error;
pub mod tracing_init;

pub use capabilities::{LOCAL_CAPABILITY, mark_local};
pub use config::Config;
pub use error::{Error, Result};
