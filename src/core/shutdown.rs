//! Shared shutdown signal.
//!
//! Shutdown is a `watch` channel of `bool`: `false` while running, `true`
//! once stop has been requested. Every long-running task holds a receiver.

use tokio::sync::watch;

/// Sending half of the shutdown signal.
pub type ShutdownSender = watch::Sender<bool>;

/// Receiving half of the shutdown signal.
pub type ShutdownReceiver = watch::Receiver<bool>;

/// Create a new, not yet triggered, shutdown signal.
pub fn channel() -> (ShutdownSender, ShutdownReceiver) {
    watch::channel(false)
}

/// Whether shutdown has been requested.
pub fn is_requested(rx: &ShutdownReceiver) -> bool {
    *rx.borrow()
}

/// Wait until shutdown is requested.
///
/// Also returns when every sender is gone, which is treated as a request.
pub async fn requested(rx: &mut ShutdownReceiver) {
    let _ = rx.wait_for(|stop| *stop).await;
}
