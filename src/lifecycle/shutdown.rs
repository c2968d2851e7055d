//! Shutdown signalling between `ThinkingProxy::stop` and the accept loop.
//!
//! The proxy runs a single accept loop that must wind down promptly so the
//! listening port is free for a subsequent `start`. `stop` calls [`Shutdown::trigger`];
//! the accept loop holds a receiver from [`Shutdown::subscribe`] inside its
//! `select!` and exits on the first signal. In-flight connection tasks are
//! detached and allowed to drain on their own.

use tokio::sync::broadcast;

/// Broadcast-backed stop signal for the accept loop.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        // Capacity 1: the signal is edge-triggered, a second trigger is a no-op.
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Hand out a receiver for the accept loop's `select!` arm.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal the accept loop to exit. Safe to call with no subscribers,
    /// which happens when `stop` runs on a proxy that never started.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
