//! Position search.
//!
//! A left-to-right scan for the first element strictly greater than the
//! item being placed. The scan is O(n) on purpose: the order may be scoped
//! to a mutable attribute and re-evaluated on every call, which rules out
//! relying on a previously established sort for binary search.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::Order;

/// What is being placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// An item not yet in the sequence.
    New,
    /// An item already stored at `current`.
    Existing {
        /// The item's slot before the move.
        current: usize,
    },
}

/// Find the index at which `item` belongs in `items`.
///
/// For [`Placement::New`] the result is an insertion index in `0..=len`;
/// equal items land after every existing equal item.
///
/// For [`Placement::Existing`] the result is the index the item should
/// occupy once moved, in `0..len`. The scan counts the item's own slot, so
/// a target past that slot is pulled back by one to account for the slot
/// being vacated.
pub fn find_position<T>(items: &[Arc<T>], item: &T, order: &Order<T>, placement: Placement) -> usize {
    let len = items.len();
    if len == 0 {
        return 0;
    }
    if len == 1 && placement == Placement::New {
        return match order.compare(item, &items[0]) {
            Ordering::Less => 0,
            _ => 1,
        };
    }

    let first_greater = items
        .iter()
        .position(|existing| order.compare(existing, item) == Ordering::Greater);

    match (first_greater, placement) {
        (None, Placement::New) => len,
        // Cannot move past its own removed slot.
        (None, Placement::Existing { .. }) => len - 1,
        (Some(k), Placement::New) => k,
        (Some(k), Placement::Existing { current }) if k > 0 && k > current => k - 1,
        (Some(k), Placement::Existing { .. }) => k,
    }
}
