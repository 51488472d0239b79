//! Live change subscriptions.

use tokio::sync::mpsc;

/// Stream of change events from a store.
///
/// Dropping the subscription disposes of it: the backend notices the
/// closed channel and stops delivering. `next` returns `None` once the
/// backend side is gone, which callers treat as a transport drop.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Creates a connected sender/subscription pair.
    pub fn channel() -> (mpsc::UnboundedSender<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Returns an already delivered event without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}
