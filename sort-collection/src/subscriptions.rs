//! Element subscription bookkeeping.
//!
//! One registration per element identity, reference-counted so the same
//! element stored in several slots is subscribed exactly once. Only touched
//! from inside the collection's critical section.

use std::collections::HashMap;
use std::sync::Arc;

use sortline_core::identity_of;
use sortline_types::{ChangeListener, Element, SubscriptionId};
use tracing::trace;

#[derive(Debug)]
struct Registration {
    id: SubscriptionId,
    slots: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Subscriptions {
    by_identity: HashMap<usize, Registration>,
}

impl Subscriptions {
    /// Subscribe to `item` if it has a change source.
    ///
    /// `listener` is only built for the first slot of an identity.
    pub(crate) fn attach<T, F>(&mut self, item: &Arc<T>, listener: F)
    where
        T: Element,
        F: FnOnce(usize) -> ChangeListener,
    {
        let Some(source) = item.change_source() else {
            return;
        };
        let identity = identity_of::<T>(item);
        if let Some(registration) = self.by_identity.get_mut(&identity) {
            registration.slots += 1;
            return;
        }
        let id = source.subscribe(listener(identity));
        trace!(%id, identity, "subscribed to element");
        self.by_identity
            .insert(identity, Registration { id, slots: 1 });
    }

    /// Release one slot of `item`; unsubscribes when the last slot goes.
    pub(crate) fn detach<T: Element>(&mut self, item: &T) {
        let identity = identity_of(item);
        let Some(registration) = self.by_identity.get_mut(&identity) else {
            return;
        };
        registration.slots -= 1;
        if registration.slots > 0 {
            return;
        }
        let id = registration.id;
        self.by_identity.remove(&identity);
        if let Some(source) = item.change_source() {
            source.unsubscribe(id);
            trace!(%id, identity, "unsubscribed from element");
        }
    }

    pub(crate) fn detach_all<T: Element>(&mut self, items: &[Arc<T>]) {
        for item in items {
            self.detach::<T>(item);
        }
    }

    /// Number of distinct elements currently subscribed.
    pub(crate) fn len(&self) -> usize {
        self.by_identity.len()
    }
}
