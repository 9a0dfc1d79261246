use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Process-wide shutdown intent.
///
/// Set once when the user quits, before the backend is signalled, and never
/// cleared. Everything that would restart or reload consults it first.
#[derive(Debug, Clone)]
pub struct LifecycleContext {
    shutdown_requested: Arc<AtomicBool>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl LifecycleContext {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Returns true only for the call that actually set the intent.
    pub fn request_shutdown(&self) -> bool {
        let first = !self.shutdown_requested.swap(true, Ordering::SeqCst);
        if first {
            self.shutdown_tx.send_replace(true);
        }
        first
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Receiver that flips to `true` once shutdown is requested.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Resolves once shutdown has been requested.
    pub async fn shutdown_requested(&self) {
        let mut rx = self.subscribe();
        // The sender lives in self, so the channel cannot close here.
        let _ = rx.wait_for(|requested| *requested).await;
    }
}

impl Default for LifecycleContext {
    fn default() -> Self {
        Self::new()
    }
}
