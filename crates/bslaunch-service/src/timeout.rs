//! Deadline race for tunnel start and stop.

use std::future::Future;
use std::time::Duration;

use crate::error::LauncherError;
use crate::tunnel::TunnelError;

/// Hard deadline for both starting and stopping the tunnel.
pub const TUNNEL_TIMEOUT: Duration = Duration::from_secs(60);

/// Which tunnel operation is being raced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Stop,
}

impl Phase {
    fn failed(self, source: TunnelError) -> LauncherError {
        match self {
            Self::Start => LauncherError::Start(source),
            Self::Stop => LauncherError::Stop(source),
        }
    }

    const fn timed_out(self, timeout: Duration) -> LauncherError {
        match self {
            Self::Start => LauncherError::StartTimeout { timeout },
            Self::Stop => LauncherError::StopTimeout { timeout },
        }
    }
}

/// Race `op` against `deadline`.
///
/// The losing branch is dropped before the outcome is returned, which
/// deregisters the timer. An operation that completes on the same tick as
/// the deadline wins.
pub async fn race<T, F>(phase: Phase, deadline: Duration, op: F) -> Result<T, LauncherError>
where
    F: Future<Output = Result<T, TunnelError>>,
{
    tokio::select! {
        biased;
        result = op => result.map_err(|source| phase.failed(source)),
        () = tokio::time::sleep(deadline) => Err(phase.timed_out(deadline)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn success_before_deadline() {
        let started = Instant::now();
        let value = race(Phase::Start, TUNNEL_TIMEOUT, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, TunnelError>(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_propagated_not_replaced() {
        let err = TunnelError::Disconnected {
            message: "bad key".into(),
        };
        let started = Instant::now();
        let result = race(Phase::Stop, TUNNEL_TIMEOUT, async { Err::<(), _>(err.clone()) }).await;
        match result {
            Err(LauncherError::Stop(inner)) => assert_eq!(inner, err),
            other => panic!("expected stop failure, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fires_for_pending_operation() {
        let started = Instant::now();
        let result = race(
            Phase::Start,
            TUNNEL_TIMEOUT,
            std::future::pending::<Result<(), TunnelError>>(),
        )
        .await;
        assert!(matches!(
            result,
            Err(LauncherError::StartTimeout { timeout }) if timeout == TUNNEL_TIMEOUT
        ));
        let elapsed = started.elapsed();
        assert!(elapsed >= TUNNEL_TIMEOUT, "fired early: {elapsed:?}");
        assert!(elapsed < TUNNEL_TIMEOUT + Duration::from_secs(1), "fired late: {elapsed:?}");
    }

    #[test]
    fn timeout_messages_mention_seconds() {
        let start = Phase::Start.timed_out(TUNNEL_TIMEOUT);
        let stop = Phase::Stop.timed_out(TUNNEL_TIMEOUT);
        assert_eq!(
            start.to_string(),
            "BrowserStack Local failed to start within 60 seconds"
        );
        assert_eq!(
            stop.to_string(),
            "BrowserStack Local failed to stop within 60 seconds"
        );
    }
}
