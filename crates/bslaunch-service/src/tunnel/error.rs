//! Tunnel process error types.

/// Failures reported by the tunnel process itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TunnelError {
    #[error("Failed to spawn tunnel binary: {reason}")]
    SpawnFailed { reason: String },

    #[error("Tunnel disconnected: {message}")]
    Disconnected { message: String },

    #[error("Unexpected reply from tunnel binary: {0}")]
    Protocol(String),

    #[error("Tunnel binary exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },
}
