//! Graceful shutdown coordination.
//!
//! Explicit state machine: `Running → Draining → Closed`, with a forced
//! `process::exit(1)` if draining exceeds the hard deadline. Triggered by
//! SIGINT/SIGTERM or an uncaught panic; all subscribers (the HTTP listener,
//! the session sweep task) observe the same broadcast signal.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Hard deadline for draining before the process is forced out.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting connections.
    Running,
    /// Listener closed, in-flight requests finishing.
    Draining,
    /// Pool closed, drain complete.
    Closed,
}

/// Coordinator for graceful shutdown.
///
/// Long-running tasks subscribe to the broadcast channel; the phase is
/// tracked atomically so the deadline watchdog can tell a completed drain
/// from a stuck one.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    phase: AtomicU8,
    runtime: Handle,
}

impl Shutdown {
    /// Create a new shutdown coordinator. Must be called inside the runtime.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            phase: AtomicU8::new(Phase::Running as u8),
            runtime: Handle::current(),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn phase(&self) -> Phase {
        match self.phase.load(Ordering::SeqCst) {
            0 => Phase::Running,
            1 => Phase::Draining,
            _ => Phase::Closed,
        }
    }

    /// Start draining. Idempotent: only the first call transitions the state
    /// and arms the deadline watchdog.
    pub fn trigger(self: &Arc<Self>) {
        let transitioned = self
            .phase
            .compare_exchange(
                Phase::Running as u8,
                Phase::Draining as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();

        if !transitioned {
            return;
        }

        warn!("[SHUTDOWN] Draining: no new connections, letting in-flight requests finish");
        let _ = self.tx.send(());

        let this = Arc::clone(self);
        self.runtime.spawn(async move {
            tokio::time::sleep(SHUTDOWN_DEADLINE).await;
            if this.phase() != Phase::Closed {
                error!(
                    "[SHUTDOWN] Drain did not complete within {}s, forcing exit",
                    SHUTDOWN_DEADLINE.as_secs()
                );
                std::process::exit(1);
            }
        });
    }

    /// Record that the listener stopped and the pool is closed.
    pub fn mark_closed(&self) {
        self.phase.store(Phase::Closed as u8, Ordering::SeqCst);
        info!("[SHUTDOWN] Drain complete");
    }

    /// Spawn the signal listener task (SIGINT / SIGTERM).
    pub fn install_signal_handlers(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.runtime.spawn(async move {
            wait_for_signal().await;
            info!("[SHUTDOWN] Termination signal received");
            this.trigger();
        });
    }

    /// Route uncaught panics into the same drain path instead of an
    /// immediate crash.
    pub fn install_panic_hook(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            previous(panic_info);
            error!("[SHUTDOWN] Uncaught panic, starting graceful shutdown");
            this.trigger();
        }));
    }
}

async fn wait_for_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("[SHUTDOWN] Failed to install SIGINT handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("[SHUTDOWN] Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_transitions_to_draining() {
        let shutdown = Arc::new(Shutdown::new());
        assert_eq!(shutdown.phase(), Phase::Running);

        let mut rx = shutdown.subscribe();
        shutdown.trigger();

        assert_eq!(shutdown.phase(), Phase::Draining);
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let shutdown = Arc::new(Shutdown::new());
        shutdown.trigger();
        shutdown.trigger();
        assert_eq!(shutdown.phase(), Phase::Draining);
    }

    #[tokio::test]
    async fn test_mark_closed() {
        let shutdown = Arc::new(Shutdown::new());
        shutdown.trigger();
        shutdown.mark_closed();
        assert_eq!(shutdown.phase(), Phase::Closed);
    }
}
