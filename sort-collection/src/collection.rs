//! SortedCollection - the thread-safe sorted observable collection.
//!
//! # Architecture
//!
//! ```text
//! caller ──┐                      ┌── OrderedSequence (sortline-core, pure)
//!          ├─> Mutex<State> ──────┤
//! element ─┘   (one critical      └── Subscriptions (one per element)
//! change        section per op)
//!                    │ events queued in commit order
//!                    v
//!               Dispatcher ──> observers (after the lock is released)
//! ```
//!
//! Every operation that needs an index resolves it inside the same critical
//! section that uses it. Nothing computed outside the lock is trusted inside
//! it, so a concurrent removal can never make an operation act on the wrong
//! slot.
//!
//! Elements that expose a [`ChangeSource`](sortline_types::ChangeSource) are
//! subscribed while they are stored. When one reports a change (optionally
//! filtered to a single watched attribute) it is located by identity and
//! moved to where the order now puts it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use sortline_core::{identity_of, Order, OrderSource, OrderedSequence};
use sortline_types::{ChangeListener, CollectionError, CollectionEvent, Element, ObserverId};
use tracing::{debug, error, trace, warn};

use crate::builder::CollectionBuilder;
use crate::dispatch::Dispatcher;
use crate::subscriptions::Subscriptions;

/// A collection kept sorted under insertion, removal and element mutation.
///
/// Cloning is cheap and yields another handle to the same collection. Element
/// subscriptions are released when the last handle is dropped.
pub struct SortedCollection<T: Element> {
    shared: Arc<Shared<T>>,
}

struct Shared<T: Element> {
    state: Mutex<State<T>>,
    dispatch: Dispatcher,
    watched: Option<String>,
    source: OrderSource,
}

struct State<T: Element> {
    sequence: OrderedSequence<T>,
    subscriptions: Subscriptions,
}

impl<T: Element> State<T> {
    /// Move every slot holding `identity` to where the order puts it.
    fn reposition(&mut self, identity: usize) -> Vec<(usize, usize)> {
        let mut moves = Vec::new();
        let Some(current) = self.sequence.position_by_identity(identity) else {
            return moves;
        };
        moves.extend(self.sequence.reposition(current));

        // Further slots of the same element only move if they are out of place.
        let extra = self.sequence.count_identity(identity).saturating_sub(1);
        for _ in 0..extra {
            let Some(index) = self.sequence.first_misplaced(identity) else {
                break;
            };
            match self.sequence.reposition(index) {
                Some(m) => moves.push(m),
                None => break,
            }
        }

        // An insert that ran between the key change and its notification
        // was placed against the stale key.
        if !self.sequence.is_sorted() {
            let repaired = self.sequence.repair();
            debug!(?repaired, "restored order around changed element");
            moves.extend(repaired);
        }
        moves
    }
}

impl<T: Element> Shared<T> {
    /// Acquire the lock for a mutation.
    fn lock(&self) -> Result<MutexGuard<'_, State<T>>, CollectionError> {
        self.state.lock().map_err(|_| {
            error!("collection lock poisoned; refusing mutation");
            CollectionError::InternalInconsistency(
                "an earlier operation panicked inside the critical section".into(),
            )
        })
    }

    /// Acquire the lock for a read. Reads still see the last state after a
    /// panic; only mutation is refused.
    fn read(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn watches(&self, attribute: &str) -> bool {
        self.watched.as_deref().map_or(true, |w| w == attribute)
    }

    fn listener(shared: Weak<Self>, identity: usize) -> ChangeListener {
        Arc::new(move |attribute: &str| {
            if let Some(shared) = shared.upgrade() {
                shared.on_element_changed(identity, attribute);
            }
        })
    }

    fn on_element_changed(&self, identity: usize, attribute: &str) {
        if !self.watches(attribute) {
            trace!(attribute, "ignoring change to unwatched attribute");
            return;
        }
        let located = |sequence: &OrderedSequence<T>| {
            sequence
                .position_by_identity(identity)
                .map(|_| identity)
        };
        if let Err(e) = self.reposition_with(located) {
            warn!(error = %e, attribute, "could not reposition changed element");
        }
    }

    /// Locate an element and reposition it as one critical section.
    fn reposition_with<F>(&self, locate: F) -> Result<Vec<(usize, usize)>, CollectionError>
    where
        F: FnOnce(&OrderedSequence<T>) -> Option<usize>,
    {
        let moves = {
            let mut state = self.lock()?;
            let Some(identity) = locate(&state.sequence) else {
                trace!("changed element is no longer stored");
                return Ok(Vec::new());
            };
            let moves = state.reposition(identity);
            self.dispatch.enqueue(
                moves
                    .iter()
                    .map(|&(from, to)| CollectionEvent::Moved { from, to }),
            );
            moves
        };
        if !moves.is_empty() {
            debug!(?moves, "repositioned changed element");
        }
        self.dispatch.drain();
        Ok(moves)
    }
}

impl<T: Element> Drop for Shared<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        let items = state.sequence.clear();
        state.subscriptions.detach_all(&items);
        debug!(released = items.len(), "collection dropped");
    }
}

impl<T: Element + Ord> SortedCollection<T> {
    /// Create an empty collection ordered by `T`'s own `Ord`.
    pub fn new() -> Self {
        Self::from_parts(Order::natural(), None)
    }
}

impl<T: Element + Ord> Default for SortedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> SortedCollection<T> {
    /// Start configuring a collection.
    pub fn builder() -> CollectionBuilder<T> {
        CollectionBuilder::new()
    }

    /// Create an empty collection with the given order and no attribute filter.
    pub fn with_order(order: Order<T>) -> Self {
        Self::from_parts(order, None)
    }

    pub(crate) fn from_parts(order: Order<T>, watched: Option<String>) -> Self {
        let source = order.source();
        debug!(order = source.name(), watched = ?watched, "collection created");
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    sequence: OrderedSequence::new(order),
                    subscriptions: Subscriptions::default(),
                }),
                dispatch: Dispatcher::default(),
                watched,
                source,
            }),
        }
    }

    // ===========================================
    // Mutators
    // ===========================================

    /// Insert an item at its sorted position and return that position.
    ///
    /// Equal items land after every existing equal item. If the item has a
    /// change source it is subscribed before the lock is released.
    pub fn insert(&self, item: impl Into<Arc<T>>) -> Result<usize, CollectionError> {
        let item = item.into();
        let index = {
            let mut state = self.shared.lock()?;
            let index = state.sequence.insert(Arc::clone(&item));
            let weak = Arc::downgrade(&self.shared);
            state
                .subscriptions
                .attach(&item, |identity| Shared::listener(weak, identity));
            self.shared
                .dispatch
                .enqueue([CollectionEvent::Added { index }]);
            index
        };
        debug!(index, "inserted");
        self.shared.dispatch.drain();
        Ok(index)
    }

    /// Remove and return the item at `index`.
    pub fn remove_at(&self, index: usize) -> Result<Arc<T>, CollectionError> {
        let removed = {
            let mut state = self.shared.lock()?;
            let removed = state.sequence.remove_at(index)?;
            state.subscriptions.detach::<T>(&removed);
            self.shared
                .dispatch
                .enqueue([CollectionEvent::Removed { index }]);
            removed
        };
        debug!(index, "removed");
        self.shared.dispatch.drain();
        Ok(removed)
    }

    /// Replace the item at `index` without re-sorting; returns the old item.
    ///
    /// The caller is responsible for the replacement fitting the order; to
    /// keep the collection sorted, remove and insert instead.
    pub fn replace_at(&self, index: usize, item: impl Into<Arc<T>>) -> Result<Arc<T>, CollectionError> {
        let item = item.into();
        let old = {
            let mut state = self.shared.lock()?;
            let old = state.sequence.replace_at(index, Arc::clone(&item))?;
            let weak = Arc::downgrade(&self.shared);
            state
                .subscriptions
                .attach(&item, |identity| Shared::listener(weak, identity));
            state.subscriptions.detach::<T>(&old);
            self.shared
                .dispatch
                .enqueue([CollectionEvent::Replaced { index }]);
            old
        };
        debug!(index, "replaced");
        self.shared.dispatch.drain();
        Ok(old)
    }

    /// Remove every item and release every subscription.
    pub fn clear(&self) -> Result<(), CollectionError> {
        let released = {
            let mut state = self.shared.lock()?;
            let items = state.sequence.clear();
            state.subscriptions.detach_all(&items);
            self.shared.dispatch.enqueue([CollectionEvent::Cleared]);
            items.len()
        };
        debug!(released, "cleared");
        self.shared.dispatch.drain();
        Ok(())
    }

    // ===========================================
    // Observers
    // ===========================================

    /// Register an observer for structural events.
    ///
    /// Observers run after the collection lock is released, one event at a
    /// time, in commit order. They may read or mutate the collection.
    pub fn observe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&CollectionEvent) + Send + Sync + 'static,
    {
        let id = self.shared.dispatch.add(Arc::new(observer));
        trace!(%id, "observer registered");
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.shared.dispatch.remove(id)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.shared.dispatch.observer_count()
    }

    // ===========================================
    // Reads
    // ===========================================

    /// Number of items.
    pub fn len(&self) -> usize {
        self.shared.read().sequence.len()
    }

    /// True if there are no items.
    pub fn is_empty(&self) -> bool {
        self.shared.read().sequence.is_empty()
    }

    /// The item at `index`.
    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        self.shared.read().sequence.get(index).cloned()
    }

    /// Every item, in order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.shared.read().sequence.as_slice().to_vec()
    }

    /// Number of elements the collection is subscribed to.
    pub fn subscription_count(&self) -> usize {
        self.shared.read().subscriptions.len()
    }

    /// True if every adjacent pair is in order.
    pub fn is_sorted(&self) -> bool {
        self.shared.read().sequence.is_sorted()
    }

    /// The attribute filter, if any.
    pub fn watched_attribute(&self) -> Option<&str> {
        self.shared.watched.as_deref()
    }

    /// Where the active order comes from.
    pub fn order_source(&self) -> OrderSource {
        self.shared.source
    }
}

impl<T: Element + Clone> SortedCollection<T> {
    /// Every item, cloned out, in order.
    pub fn values(&self) -> Vec<T> {
        self.shared
            .read()
            .sequence
            .iter()
            .map(|item| T::clone(item))
            .collect()
    }
}

impl<T: Element + PartialEq> SortedCollection<T> {
    /// Remove the first item matching `item` by identity or equality.
    ///
    /// Returns the index it occupied, or `None` if nothing matched.
    pub fn remove(&self, item: &T) -> Result<Option<usize>, CollectionError> {
        let index = {
            let mut state = self.shared.lock()?;
            let Some(index) = state.sequence.position_of(item) else {
                trace!("remove: no matching item");
                return Ok(None);
            };
            let removed = state.sequence.remove_at(index)?;
            state.subscriptions.detach::<T>(&removed);
            self.shared
                .dispatch
                .enqueue([CollectionEvent::Removed { index }]);
            index
        };
        debug!(index, "removed by value");
        self.shared.dispatch.drain();
        Ok(Some(index))
    }

    /// Run the change reaction for `item` by hand.
    ///
    /// For elements without a change source, or whose change happened
    /// without a notification. The item is matched by identity or
    /// equality; returns the moves performed.
    pub fn notify_changed(&self, item: &T, attribute: &str) -> Result<Vec<(usize, usize)>, CollectionError> {
        if !self.shared.watches(attribute) {
            return Ok(Vec::new());
        }
        self.shared.reposition_with(|sequence| {
            sequence
                .position_of(item)
                .and_then(|index| sequence.get(index))
                .map(|found| identity_of::<T>(found))
        })
    }

    /// True if any item matches by identity or equality.
    pub fn contains(&self, item: &T) -> bool {
        self.shared.read().sequence.position_of(item).is_some()
    }

    /// Index of the first item matching by identity or equality.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.shared.read().sequence.position_of(item)
    }
}

impl<T: Element> Clone for SortedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Element> fmt::Debug for SortedCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedCollection")
            .field("len", &self.len())
            .field("order", &self.shared.source)
            .field("watched", &self.shared.watched)
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}
