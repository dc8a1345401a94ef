use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Handle for a session-change listener. The listener stops when the handle
/// is dropped or [`Subscription::unsubscribe`] is called.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Runs `handler` for every value published on `receiver`, on its own task.
    pub(crate) fn spawn<T, F>(mut receiver: broadcast::Receiver<T>, mut handler: F) -> Self
    where
        T: Clone + Send + 'static,
        F: FnMut(T) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => handler(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Session listener fell behind; events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self { handle }
    }

    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_handler_receives_events() {
        let (tx, rx) = broadcast::channel(8);
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();
        let _subscription = Subscription::spawn(rx, move |n: u32| {
            let _ = seen_tx.send(n);
        });

        tx.send(7).unwrap();

        assert_eq!(seen_rx.recv().await, Some(7));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let (tx, rx) = broadcast::channel(8);
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let subscription = Subscription::spawn(rx, move |_: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscription.unsubscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;
        // Once the task is gone its receiver is dropped and sends fail.
        assert!(tx.send(1).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listener_ends_when_channel_closes() {
        let (tx, rx) = broadcast::channel::<u32>(8);
        let subscription = Subscription::spawn(rx, |_| {});

        drop(tx);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!subscription.is_active());
    }
}
