//! The optional capability an element uses to report attribute changes.
//!
//! A collection subscribes to an element when it is inserted and
//! unsubscribes when it leaves. The element only ever fires its listeners;
//! the registration lifecycle belongs to the collection.
//!
//! Elements opt in by returning a [`ChangeSource`] from
//! [`Element::change_source`]. Most elements embed a [`ChangeNotifier`]:
//!
//! ```
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use sortline_types::{ChangeNotifier, ChangeSource, Element};
//!
//! struct Reading {
//!     value: AtomicI64,
//!     changes: ChangeNotifier,
//! }
//!
//! impl Reading {
//!     fn set(&self, v: i64) {
//!         self.value.store(v, Ordering::SeqCst);
//!         self.changes.notify("value");
//!     }
//! }
//!
//! impl Element for Reading {
//!     fn change_source(&self) -> Option<&dyn ChangeSource> {
//!         Some(&self.changes)
//!     }
//! }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::SubscriptionId;

/// Callback receiving the name of the attribute that changed.
pub type ChangeListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Something that can deliver attribute-change notifications.
pub trait ChangeSource: Send + Sync {
    /// Register a listener. It stays registered until `unsubscribe`.
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId;

    /// Remove a listener. Returns `false` if it was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// A value that can be stored in a sorted collection.
///
/// The default implementation has no change capability: such elements can be
/// inserted and removed but are never repositioned automatically.
pub trait Element: Send + Sync + 'static {
    /// The element's change source, if it reports attribute changes.
    fn change_source(&self) -> Option<&dyn ChangeSource> {
        None
    }
}

macro_rules! plain_element {
    ($($t:ty),* $(,)?) => {
        $(impl Element for $t {})*
    };
}

plain_element!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char, f32, f64,
    String, &'static str,
);

impl<A: Element, B: Element> Element for (A, B) {}

/// Ready-made [`ChangeSource`] for elements to embed.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Mutex<Vec<(SubscriptionId, ChangeListener)>>,
}

impl ChangeNotifier {
    /// Create a notifier with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tell every listener that `attribute` changed.
    ///
    /// Listeners run after the notifier's own lock is released, so a
    /// listener may subscribe or unsubscribe without deadlocking.
    pub fn notify(&self, attribute: &str) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(attribute);
        }
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ChangeSource for ChangeNotifier {
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
