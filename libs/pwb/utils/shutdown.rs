//! Graceful shutdown management

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tracing::info;

/// Process-wide stop signal for long-running clients
///
/// Cloning shares the same flag. `trigger` wakes every task parked in
/// `stopped` or `interruptible_sleep` at once.
#[derive(Clone)]
pub struct ShutdownManager {
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownManager {
    /// Create a new shutdown manager with running state
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Spawn a Ctrl+C signal handler that triggers shutdown
    pub fn spawn_signal_handler(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal (Ctrl+C)");
                manager.trigger();
            }
        });
    }

    pub fn trigger(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("Shutting down gracefully...");
        }
        self.notify.notify_waiters();
    }

    /// Check if the process should continue running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been triggered
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for a duration, but wake early if shutdown is triggered
    ///
    /// Returns `false` when woken by shutdown.
    pub async fn interruptible_sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.is_running(),
            _ = self.stopped() => false,
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_trigger_interrupts_sleep() {
        let shutdown = ShutdownManager::new();
        let remote = shutdown.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            remote.trigger();
        });

        let started = tokio::time::Instant::now();
        assert!(!shutdown.interruptible_sleep(Duration::from_secs(60)).await);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!shutdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_while_running() {
        let shutdown = ShutdownManager::new();
        assert!(shutdown.interruptible_sleep(Duration::from_millis(50)).await);
        assert!(shutdown.is_running());
    }

    #[tokio::test]
    async fn test_stopped_returns_after_trigger() {
        let shutdown = ShutdownManager::new();
        shutdown.trigger();
        shutdown.stopped().await;
        shutdown.trigger();
    }
}
