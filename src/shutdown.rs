//! Shutdown controller: turns a termination signal into one-time teardown.
//!
//! The state machine is `Running -> ShuttingDown -> Stopped`, each
//! transition taken exactly once via compare-and-swap. The signal listener
//! only advances the phase and wakes waiters; the server loop observes the
//! phase and performs the actual listener drop and log-sink close, outside
//! signal context.

use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, error, info};

/// Lifecycle phase of a server instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Accepting connections.
    Running = 0,
    /// Termination requested; teardown in progress.
    ShuttingDown = 1,
    /// Teardown finished.
    Stopped = 2,
}

impl From<u8> for Phase {
    fn from(value: u8) -> Self {
        match value {
            0 => Phase::Running,
            1 => Phase::ShuttingDown,
            _ => Phase::Stopped,
        }
    }
}

/// Shared shutdown state machine.
pub struct Shutdown {
    phase: AtomicU8,
    notify: Notify,
}

impl Shutdown {
    /// A controller in the `Running` phase.
    pub fn new() -> Self {
        Shutdown {
            phase: AtomicU8::new(Phase::Running as u8),
            notify: Notify::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        Phase::from(self.phase.load(Ordering::Acquire))
    }

    /// True once shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.phase() != Phase::Running
    }

    /// Request shutdown.
    ///
    /// Only the first call takes `Running -> ShuttingDown` and wakes
    /// waiters; repeats while already shutting down return `false` and do
    /// nothing.
    pub fn begin(&self) -> bool {
        let advanced = self
            .phase
            .compare_exchange(
                Phase::Running as u8,
                Phase::ShuttingDown as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if advanced {
            self.notify.notify_waiters();
        }
        advanced
    }

    /// Mark teardown finished: `ShuttingDown -> Stopped`, exactly once.
    pub fn complete(&self) -> bool {
        self.phase
            .compare_exchange(
                Phase::ShuttingDown as u8,
                Phase::Stopped as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Wait until shutdown has been requested.
    ///
    /// Returns immediately if it already has.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);

            // Register before checking the phase so a notification landing
            // in between is not lost.
            notified.as_mut().enable();
            if self.is_shutting_down() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Listen for termination signals and request shutdown.
///
/// Interrupt (ctrl-c) and terminate are the two recognized signals. The
/// handler body does nothing beyond the atomic phase flip; signals after
/// the first are ignored by `begin`.
pub async fn listen_for_signals(shutdown: Arc<Shutdown>) {
    loop {
        match wait_for_termination().await {
            Ok(signal) => {
                if shutdown.begin() {
                    info!(signal, "Termination signal received, shutting down");
                } else {
                    debug!(signal, "Already shutting down, signal ignored");
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handlers");
                return;
            }
        }
    }
}

#[cfg(unix)]
async fn wait_for_termination() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "interrupt"),
        _ = terminate.recv() => Ok("terminate"),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "interrupt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_running() {
        let shutdown = Shutdown::new();
        assert_eq!(shutdown.phase(), Phase::Running);
        assert!(!shutdown.is_shutting_down());
    }

    #[test]
    fn test_begin_advances_once() {
        let shutdown = Shutdown::new();

        assert!(shutdown.begin());
        assert_eq!(shutdown.phase(), Phase::ShuttingDown);

        // Second signal is ignored, not reprocessed.
        assert!(!shutdown.begin());
        assert_eq!(shutdown.phase(), Phase::ShuttingDown);
    }

    #[test]
    fn test_complete_requires_shutting_down() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.complete());

        shutdown.begin();
        assert!(shutdown.complete());
        assert_eq!(shutdown.phase(), Phase::Stopped);

        // Terminal: no further transitions.
        assert!(!shutdown.complete());
        assert!(!shutdown.begin());
    }

    #[tokio::test]
    async fn test_wait_returns_after_begin() {
        let shutdown = Arc::new(Shutdown::new());

        let waiter = {
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move { shutdown.wait().await })
        };

        shutdown.begin();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait never woke")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_already_down() {
        let shutdown = Shutdown::new();
        shutdown.begin();

        tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .expect("wait should not block");
    }
}
