//! Collection configuration.
//!
//! Misconfiguration surfaces from [`CollectionBuilder::build`], never on
//! first use.

use std::cmp::Ordering;

use sortline_core::Order;
use sortline_types::{ConfigError, Element};

use crate::SortedCollection;

/// Builder for [`SortedCollection`].
///
/// Exactly one ordering source must be chosen: [`natural`](Self::natural),
/// [`comparator`](Self::comparator), [`by_key`](Self::by_key) or
/// [`order`](Self::order).
pub struct CollectionBuilder<T> {
    order: Option<Order<T>>,
    conflict: Option<ConfigError>,
    watched: Option<String>,
}

impl<T: Element> CollectionBuilder<T> {
    /// Start with no ordering source and no attribute filter.
    pub fn new() -> Self {
        Self {
            order: None,
            conflict: None,
            watched: None,
        }
    }

    /// Order with an injected comparator.
    pub fn comparator<F>(self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.order(Order::comparator(compare))
    }

    /// Order by a key read from each element on every comparison.
    pub fn by_key<K, F>(self, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order(Order::by_key(key))
    }

    /// Use a prepared [`Order`].
    pub fn order(mut self, order: Order<T>) -> Self {
        match &self.order {
            Some(existing) => {
                if self.conflict.is_none() {
                    self.conflict = Some(ConfigError::ConflictingOrder {
                        first: existing.source().name(),
                        second: order.source().name(),
                    });
                }
            }
            None => self.order = Some(order),
        }
        self
    }

    /// Only reposition on changes to this attribute.
    ///
    /// Without a filter every reported change is considered.
    pub fn watch_attribute(mut self, name: impl Into<String>) -> Self {
        self.watched = Some(name.into());
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<SortedCollection<T>, ConfigError> {
        if let Some(conflict) = self.conflict {
            return Err(conflict);
        }
        let order = self.order.ok_or(ConfigError::MissingOrder)?;
        if let Some(name) = &self.watched {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyWatchedAttribute);
            }
        }
        Ok(SortedCollection::from_parts(order, self.watched))
    }
}

impl<T: Element + Ord> CollectionBuilder<T> {
    /// Order by `T`'s own `Ord` implementation.
    pub fn natural(self) -> Self {
        self.order(Order::natural())
    }
}

impl<T: Element> Default for CollectionBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
