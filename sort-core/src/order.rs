//! Ordering strategy.
//!
//! Exactly one source of ordering is active for a collection: the element
//! type's own `Ord`, an injected comparator, or a key extracted from each
//! element. Natural order is only constructible when `T: Ord`, so a missing
//! intrinsic order is a compile error rather than a runtime surprise.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type CompareFn<T> = dyn Fn(&T, &T) -> Ordering + Send + Sync;

/// Where an [`Order`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSource {
    /// The element type's `Ord` implementation.
    Natural,
    /// An injected comparator.
    Comparator,
    /// An `Ord` key extracted from each element.
    Key,
}

impl OrderSource {
    /// Short name used in configuration errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            OrderSource::Natural => "natural",
            OrderSource::Comparator => "comparator",
            OrderSource::Key => "key",
        }
    }
}

/// A total order over `T`.
pub struct Order<T> {
    compare: Arc<CompareFn<T>>,
    source: OrderSource,
}

impl<T: Ord + 'static> Order<T> {
    /// Order by `T`'s own `Ord` implementation.
    pub fn natural() -> Self {
        Self {
            compare: Arc::new(|a: &T, b: &T| a.cmp(b)),
            source: OrderSource::Natural,
        }
    }
}

impl<T: 'static> Order<T> {
    /// Order with an injected comparator.
    pub fn comparator<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            compare: Arc::new(compare),
            source: OrderSource::Comparator,
        }
    }

    /// Order by a key extracted from each element.
    ///
    /// The key is re-read on every comparison, so elements with interior
    /// mutability are compared by their current value.
    pub fn by_key<K, F>(key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self {
            compare: Arc::new(move |a: &T, b: &T| key(a).cmp(&key(b))),
            source: OrderSource::Key,
        }
    }

    /// The same order, descending.
    pub fn reversed(self) -> Self {
        let inner = self.compare;
        Self {
            compare: Arc::new(move |a: &T, b: &T| inner(b, a)),
            source: self.source,
        }
    }
}

impl<T> Order<T> {
    /// Compare two elements.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }

    /// Where this order comes from.
    pub fn source(&self) -> OrderSource {
        self.source
    }
}

impl<T> Clone for Order<T> {
    fn clone(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
            source: self.source,
        }
    }
}

impl<T> fmt::Debug for Order<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Order").field("source", &self.source).finish()
    }
}
