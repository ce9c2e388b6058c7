//! Cancellation for a single countdown sequence.
//!
//! The consumer keeps the [`CancelHandle`]; the countdown owns the
//! [`CancelSignal`]. Calling [`CancelHandle::cancel`] or dropping the handle
//! both stop the sequence, so a countdown never outlives whoever asked for it.

use tokio::sync::watch;

/// Creates a connected handle/signal pair.
pub fn pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow() || self.0.has_changed().is_err()
    }

    /// Resolves once the sequence is cancelled or the handle is dropped.
    pub async fn cancelled(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}
