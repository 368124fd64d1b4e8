//! Logging setup for the `bslaunch` binary and its libraries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Targets the default filter lets through. The binary logs under its own
/// name, not under the library crate it is built from.
const TARGETS: [&str; 3] = ["bslaunch", "bslaunch_service", "bslaunch_core"];

/// Filter directives enabling `level` for every bslaunch target.
pub fn default_filter(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise [`default_filter`] is used with
/// `level`. Logs go to stderr so they never interleave with the wrapped
/// test command's stdout. With `log_json`, lines are structured JSON.
pub fn init_tracing(level: &str, log_json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));
    let layer = fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_json {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer).init();
    }
}
