//! Cooperative-suspend access to a [`SortedCollection`].
//!
//! Async callers queue on a `tokio::sync::Mutex` gate instead of blocking a
//! runtime worker on the collection lock. The collection's own critical
//! sections never span an `.await`, so the inner lock is only ever held for
//! the O(n) work of one operation. Element change reactions bypass the gate
//! and take the inner lock directly; the inner lock alone keeps structural
//! mutations mutually exclusive.

use std::sync::Arc;
use std::time::Duration;

use sortline_types::{CollectionError, CollectionEvent, Element, ObserverId};
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::{trace, warn};

use crate::SortedCollection;

/// Async facade over a [`SortedCollection`].
///
/// Cloning yields another handle sharing the same collection and gate.
///
/// Only the mutators here queue on the async gate. Element change reactions
/// (an element firing its [`ChangeSource`](sortline_types::ChangeSource))
/// and calls made through [`collection`](Self::collection) take the inner
/// `std::sync::Mutex` directly, on whatever thread fires them. A task that
/// fires many changes back to back, or a gated mutation waiting behind
/// them, blocks its runtime worker for that time rather than suspending.
/// Fire bulk element changes from `tokio::task::spawn_blocking` when that
/// matters.
pub struct AsyncSortedCollection<T: Element> {
    inner: SortedCollection<T>,
    gate: Arc<Mutex<()>>,
    lock_timeout: Option<Duration>,
}

impl<T: Element> AsyncSortedCollection<T> {
    /// Wrap a collection.
    pub fn new(inner: SortedCollection<T>) -> Self {
        Self {
            inner,
            gate: Arc::new(Mutex::new(())),
            lock_timeout: None,
        }
    }

    /// Bound how long a mutation waits for its turn.
    ///
    /// A mutation that cannot start in time fails with
    /// [`CollectionError::LockTimeout`] instead of waiting indefinitely.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// The configured wait bound, if any.
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }

    /// The wrapped collection, for reads and observer registration.
    pub fn collection(&self) -> &SortedCollection<T> {
        &self.inner
    }

    async fn enter(&self) -> Result<MutexGuard<'_, ()>, CollectionError> {
        match self.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, self.gate.lock())
                .await
                .map_err(|_| {
                    warn!(?limit, "timed out waiting for collection");
                    CollectionError::LockTimeout(limit)
                }),
            None => Ok(self.gate.lock().await),
        }
    }

    /// Insert an item at its sorted position and return that position.
    pub async fn insert(&self, item: impl Into<Arc<T>>) -> Result<usize, CollectionError> {
        let _turn = self.enter().await?;
        self.inner.insert(item)
    }

    /// Remove and return the item at `index`.
    pub async fn remove_at(&self, index: usize) -> Result<Arc<T>, CollectionError> {
        let _turn = self.enter().await?;
        self.inner.remove_at(index)
    }

    /// Replace the item at `index` without re-sorting; returns the old item.
    pub async fn replace_at(&self, index: usize, item: impl Into<Arc<T>>) -> Result<Arc<T>, CollectionError> {
        let _turn = self.enter().await?;
        self.inner.replace_at(index, item)
    }

    /// Remove every item.
    pub async fn clear(&self) -> Result<(), CollectionError> {
        let _turn = self.enter().await?;
        self.inner.clear()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if there are no items.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The item at `index`.
    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        self.inner.get(index)
    }

    /// Every item, in order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.inner.snapshot()
    }

    /// Stream of structural events.
    ///
    /// Events arrive in commit order. Unregister with
    /// `collection().unobserve(id)`; dropping the receiver only silences it.
    pub fn events(&self) -> (ObserverId, mpsc::UnboundedReceiver<CollectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.observe(move |event| {
            if tx.send(*event).is_err() {
                trace!("event receiver dropped");
            }
        });
        (id, rx)
    }
}

impl<T: Element + PartialEq> AsyncSortedCollection<T> {
    /// Remove the first item matching `item` by identity or equality.
    pub async fn remove(&self, item: &T) -> Result<Option<usize>, CollectionError> {
        let _turn = self.enter().await?;
        self.inner.remove(item)
    }

    /// Run the change reaction for `item` by hand.
    pub async fn notify_changed(&self, item: &T, attribute: &str) -> Result<Vec<(usize, usize)>, CollectionError> {
        let _turn = self.enter().await?;
        self.inner.notify_changed(item, attribute)
    }
}

impl<T: Element + Clone> AsyncSortedCollection<T> {
    /// Every item, cloned out, in order.
    pub fn values(&self) -> Vec<T> {
        self.inner.values()
    }
}

impl<T: Element> Clone for AsyncSortedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            gate: Arc::clone(&self.gate),
            lock_timeout: self.lock_timeout,
        }
    }
}

impl<T: Element> From<SortedCollection<T>> for AsyncSortedCollection<T> {
    fn from(inner: SortedCollection<T>) -> Self {
        Self::new(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> AsyncSortedCollection<i32> {
        AsyncSortedCollection::new(SortedCollection::new())
    }

    #[tokio::test]
    async fn async_inserts_are_sorted() {
        let c = collection();
        for v in [5, 4, 3, 2, 1] {
            c.insert(v).await.unwrap();
        }
        assert_eq!(c.values(), vec![1, 2, 3, 4, 5]);

        c.remove(&5).await.unwrap();
        c.remove(&1).await.unwrap();
        assert_eq!(c.values(), vec![2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_lose_nothing() {
        let c = collection();
        let tasks: i32 = 16;
        let per_task: i32 = 25;

        let handles: Vec<_> = (0..tasks)
            .map(|t| {
                let c = c.clone();
                tokio::spawn(async move {
                    for i in 0..per_task {
                        c.insert(i * tasks + t).await.unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(c.len(), (tasks * per_task) as usize);
        assert_eq!(c.values(), (0..tasks * per_task).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn events_stream_in_order() {
        let c = collection();
        let (id, mut rx) = c.events();

        c.insert(2).await.unwrap();
        c.insert(1).await.unwrap();
        c.remove_at(1).await.unwrap();
        c.clear().await.unwrap();

        assert_eq!(rx.recv().await, Some(CollectionEvent::Added { index: 0 }));
        assert_eq!(rx.recv().await, Some(CollectionEvent::Added { index: 0 }));
        assert_eq!(rx.recv().await, Some(CollectionEvent::Removed { index: 1 }));
        assert_eq!(rx.recv().await, Some(CollectionEvent::Cleared));

        assert!(c.collection().unobserve(id));
    }

    #[tokio::test]
    async fn bounded_wait_reports_timeout() {
        let c = collection().with_lock_timeout(Duration::from_millis(20));
        assert_eq!(c.lock_timeout(), Some(Duration::from_millis(20)));

        let held = c.gate.lock().await;
        let err = c.insert(1).await.unwrap_err();
        assert!(matches!(err, CollectionError::LockTimeout(_)));
        drop(held);

        assert_eq!(c.insert(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn replace_and_out_of_range() {
        let c = collection();
        c.insert(10).await.unwrap();
        let old = c.replace_at(0, 20).await.unwrap();
        assert_eq!(*old, 10);
        assert!(c.remove_at(3).await.unwrap_err().is_out_of_range());
        assert_eq!(c.get(0).map(|v| *v), Some(20));
    }
}
