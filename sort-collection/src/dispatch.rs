//! Observer delivery.
//!
//! Events are queued while the collection lock is held, which fixes their
//! order to the commit order. Delivery happens later, outside that lock, by
//! whichever caller finds nobody else draining. An observer that mutates the
//! collection re-enters here, finds a drain in progress and returns; its
//! event is delivered by the outer drain once the current one finishes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use sortline_types::{CollectionEvent, ObserverId};

pub(crate) type Observer = Arc<dyn Fn(&CollectionEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Dispatcher {
    observers: Mutex<Vec<(ObserverId, Observer)>>,
    queue: Mutex<VecDeque<CollectionEvent>>,
    draining: AtomicBool,
}

/// Clears the draining flag even if an observer panics.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Dispatcher {
    pub(crate) fn add(&self, observer: Observer) -> ObserverId {
        let id = ObserverId::next();
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    pub(crate) fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Queue events. Call with the collection lock held.
    pub(crate) fn enqueue<I: IntoIterator<Item = CollectionEvent>>(&self, events: I) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(events);
    }

    /// Deliver queued events. Call with the collection lock released.
    pub(crate) fn drain(&self) {
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }
            {
                let _guard = DrainGuard(&self.draining);
                while let Some(event) = self.pop() {
                    let observers: Vec<Observer> = self
                        .observers
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .iter()
                        .map(|(_, o)| Arc::clone(o))
                        .collect();
                    for observer in observers {
                        observer(&event);
                    }
                }
            }
            // An event queued between our last pop and the flag reset would
            // otherwise wait for the next mutation.
            if self.is_queue_empty() {
                return;
            }
        }
    }

    fn pop(&self) -> Option<CollectionEvent> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn is_queue_empty(&self) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}
