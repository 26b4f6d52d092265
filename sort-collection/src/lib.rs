//! # sortline-collection
//!
//! Thread-safe sorted observable collection.
//!
//! This is the crate applications use to keep a list of elements sorted
//! while the elements themselves change.
//!
//! ## Features
//!
//! - **Always Sorted**: inserts land at their ordered position; elements that
//!   report a change are moved without a full re-sort
//! - **Observable**: structural events (`Added`, `Removed`, `Replaced`,
//!   `Moved`, `Cleared`) are delivered in commit order after the lock is released
//! - **Concurrent**: every operation locates and mutates inside one critical
//!   section; blocking ([`SortedCollection`]) and async
//!   ([`AsyncSortedCollection`]) acquisition styles
//! - **Pure Core**: ordering logic lives in sortline-core
//!
//! ## Example
//!
//! ```
//! use sortline_collection::SortedCollection;
//!
//! let scores = SortedCollection::<i32>::new();
//! for v in [5, 4, 3, 2, 1] {
//!     scores.insert(v).unwrap();
//! }
//! assert_eq!(scores.values(), vec![1, 2, 3, 4, 5]);
//!
//! scores.remove(&5).unwrap();
//! scores.remove(&1).unwrap();
//! assert_eq!(scores.values(), vec![2, 3, 4]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod async_collection;
pub mod builder;
pub mod collection;
mod dispatch;
mod subscriptions;

pub use async_collection::AsyncSortedCollection;
pub use builder::CollectionBuilder;
pub use collection::SortedCollection;
pub use sortline_core::{Order, OrderSource};
pub use sortline_types::{
    ChangeListener, ChangeNotifier, ChangeSource, CollectionError, CollectionEvent, ConfigError,
    Element, ObserverId, SubscriptionId,
};
