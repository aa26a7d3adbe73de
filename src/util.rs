//! Utility functions and helpers.

use tokio::sync::mpsc;

/// Send a value through a channel, logging if the receiver is gone.
///
/// Background tasks outlive the event loop during shutdown; their late
/// results are dropped here instead of erroring.
pub fn send_or_log<T>(tx: &mpsc::UnboundedSender<T>, value: T, context: &str) {
    if tx.send(value).is_err() {
        tracing::debug!("Dropped {}: event loop has exited", context);
    }
}
