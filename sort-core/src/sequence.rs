//! Ordered sequence.
//!
//! Owns the sorted `Vec` and applies structural mutations. Every mutation
//! that takes an index validates it first; nothing here locks, so the
//! caller decides what runs as one atomic step.

use std::sync::Arc;

use sortline_types::CollectionError;

use crate::{find_position, Order, Placement};

/// Identity of an element: the address of its allocation.
///
/// Two `Arc`s pointing at the same value share an identity; equal values in
/// separate allocations do not.
pub fn identity_of<T>(item: &T) -> usize {
    item as *const T as *const () as usize
}

/// A sequence kept sorted under an [`Order`].
#[derive(Debug)]
pub struct OrderedSequence<T> {
    items: Vec<Arc<T>>,
    order: Order<T>,
}

impl<T> OrderedSequence<T> {
    /// Create an empty sequence.
    pub fn new(order: Order<T>) -> Self {
        Self {
            items: Vec::new(),
            order,
        }
    }

    /// The active order.
    pub fn order(&self) -> &Order<T> {
        &self.order
    }

    /// Insert an item at its sorted position and return that position.
    pub fn insert(&mut self, item: Arc<T>) -> usize {
        let index = find_position(&self.items, &item, &self.order, Placement::New);
        self.items.insert(index, item);
        index
    }

    /// Remove and return the item at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<Arc<T>, CollectionError> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Replace the item at `index` without re-sorting; returns the old item.
    ///
    /// The caller is responsible for the replacement fitting the order.
    pub fn replace_at(&mut self, index: usize, item: Arc<T>) -> Result<Arc<T>, CollectionError> {
        self.check_index(index)?;
        Ok(std::mem::replace(&mut self.items[index], item))
    }

    /// Remove every item, returning them in order.
    pub fn clear(&mut self) -> Vec<Arc<T>> {
        std::mem::take(&mut self.items)
    }

    /// Move the item at `current` to where the order now puts it.
    ///
    /// Returns `(from, to)` if the item moved.
    pub fn reposition(&mut self, current: usize) -> Option<(usize, usize)> {
        let item = self.items.get(current)?;
        let target = find_position(
            &self.items,
            item,
            &self.order,
            Placement::Existing { current },
        );
        if target == current {
            return None;
        }
        let item = self.items.remove(current);
        self.items.insert(target, item);
        Some((current, target))
    }

    /// Restore the order with a stable insertion sort.
    ///
    /// Needed when an item was placed against a key that changed before its
    /// owner reported it. Returns each `(from, to)` move in the order applied.
    pub fn repair(&mut self) -> Vec<(usize, usize)> {
        let mut moves = Vec::new();
        for i in 1..self.items.len() {
            if self.in_order(i - 1, i) {
                continue;
            }
            // The prefix is sorted; land after every equal item.
            let target = (0..i)
                .find(|&j| self.order.compare(&self.items[j], &self.items[i]) == std::cmp::Ordering::Greater)
                .unwrap_or(i);
            let item = self.items.remove(i);
            self.items.insert(target, item);
            moves.push((i, target));
        }
        moves
    }

    /// First index holding the element with this identity.
    pub fn position_by_identity(&self, identity: usize) -> Option<usize> {
        self.items
            .iter()
            .position(|e| identity_of::<T>(e) == identity)
    }

    /// Number of slots holding the element with this identity.
    pub fn count_identity(&self, identity: usize) -> usize {
        self.items
            .iter()
            .filter(|e| identity_of::<T>(e) == identity)
            .count()
    }

    /// First slot with this identity whose neighbours violate the order.
    pub fn first_misplaced(&self, identity: usize) -> Option<usize> {
        (0..self.items.len())
            .find(|&i| identity_of::<T>(&self.items[i]) == identity && !self.fits_at(i))
    }

    /// True if every adjacent pair is in order.
    pub fn is_sorted(&self) -> bool {
        (1..self.items.len()).all(|i| self.in_order(i - 1, i))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item at `index`.
    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.items.get(index)
    }

    /// Iterate in order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.iter()
    }

    /// The items as a slice.
    pub fn as_slice(&self) -> &[Arc<T>] {
        &self.items
    }

    fn check_index(&self, index: usize) -> Result<(), CollectionError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(CollectionError::OutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    fn in_order(&self, a: usize, b: usize) -> bool {
        self.order.compare(&self.items[a], &self.items[b]) != std::cmp::Ordering::Greater
    }

    fn fits_at(&self, i: usize) -> bool {
        (i == 0 || self.in_order(i - 1, i)) && (i + 1 >= self.items.len() || self.in_order(i, i + 1))
    }
}

impl<T: PartialEq> OrderedSequence<T> {
    /// First index holding `item`, matched by identity or equality.
    pub fn position_of(&self, item: &T) -> Option<usize> {
        let identity = identity_of(item);
        self.items
            .iter()
            .position(|e| identity_of::<T>(e) == identity || **e == *item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering as AtomicOrdering};

    fn natural() -> OrderedSequence<i32> {
        OrderedSequence::new(Order::natural())
    }

    fn values(seq: &OrderedSequence<i32>) -> Vec<i32> {
        seq.iter().map(|v| **v).collect()
    }

    #[derive(Debug)]
    struct Cell(AtomicI32);

    impl Cell {
        fn get(&self) -> i32 {
            self.0.load(AtomicOrdering::SeqCst)
        }
        fn set(&self, v: i32) {
            self.0.store(v, AtomicOrdering::SeqCst)
        }
    }

    fn cells(keys: &[i32]) -> (OrderedSequence<Cell>, Vec<Arc<Cell>>) {
        let mut seq = OrderedSequence::new(Order::by_key(|c: &Cell| c.get()));
        let handles: Vec<Arc<Cell>> = keys.iter().map(|k| Arc::new(Cell(AtomicI32::new(*k)))).collect();
        for h in &handles {
            seq.insert(Arc::clone(h));
        }
        (seq, handles)
    }

    #[test]
    fn inserts_in_reverse_come_out_sorted() {
        let mut seq = natural();
        for v in [5, 4, 3, 2, 1] {
            assert_eq!(seq.insert(Arc::new(v)), 0);
        }
        assert_eq!(values(&seq), vec![1, 2, 3, 4, 5]);
        assert!(seq.is_sorted());
    }

    #[test]
    fn remove_by_value_then_index() {
        let mut seq = natural();
        for v in [5, 4, 3, 2, 1] {
            seq.insert(Arc::new(v));
        }
        let i = seq.position_of(&5).unwrap();
        seq.remove_at(i).unwrap();
        let i = seq.position_of(&1).unwrap();
        seq.remove_at(i).unwrap();
        assert_eq!(values(&seq), vec![2, 3, 4]);
    }

    #[test]
    fn remove_out_of_range() {
        let mut seq = natural();
        seq.insert(Arc::new(1));
        let err = seq.remove_at(3).unwrap_err();
        assert!(matches!(err, CollectionError::OutOfRange { index: 3, len: 1 }));
    }

    #[test]
    fn duplicates_are_stable_for_new_items() {
        let mut seq: OrderedSequence<(i32, &'static str)> =
            OrderedSequence::new(Order::by_key(|(k, _): &(i32, &'static str)| *k));
        seq.insert(Arc::new((1, "a")));
        seq.insert(Arc::new((1, "b")));
        seq.insert(Arc::new((0, "z")));
        seq.insert(Arc::new((1, "c")));
        let tags: Vec<&str> = seq.iter().map(|e| e.1).collect();
        assert_eq!(tags, vec!["z", "a", "b", "c"]);
    }

    #[test]
    fn removing_one_of_many_duplicates() {
        let mut seq = natural();
        for _ in 0..5 {
            seq.insert(Arc::new(1));
        }
        let i = seq.position_of(&1).unwrap();
        seq.remove_at(i).unwrap();
        assert_eq!(values(&seq), vec![1, 1, 1, 1]);
    }

    #[test]
    fn replace_does_not_resort() {
        let mut seq = natural();
        for v in [1, 2, 3] {
            seq.insert(Arc::new(v));
        }
        let old = seq.replace_at(0, Arc::new(10)).unwrap();
        assert_eq!(*old, 1);
        assert_eq!(values(&seq), vec![10, 2, 3]);
        assert!(!seq.is_sorted());
        assert!(seq.replace_at(3, Arc::new(0)).is_err());
    }

    #[test]
    fn reposition_moves_to_front() {
        let (mut seq, handles) = cells(&[1, 2, 3, 4, 5]);
        handles[4].set(0);

        let current = seq.position_by_identity(identity_of::<Cell>(&handles[4])).unwrap();
        assert_eq!(current, 4);
        assert_eq!(seq.reposition(current), Some((4, 0)));

        let keys: Vec<i32> = seq.iter().map(|c| c.get()).collect();
        assert_eq!(keys, vec![0, 1, 2, 3, 4]);
        assert!(Arc::ptr_eq(seq.get(0).unwrap(), &handles[4]));
    }

    #[test]
    fn reposition_moves_to_back() {
        let (mut seq, handles) = cells(&[1, 2, 3, 4, 5]);
        handles[0].set(9);
        assert_eq!(seq.reposition(0), Some((0, 4)));
        let keys: Vec<i32> = seq.iter().map(|c| c.get()).collect();
        assert_eq!(keys, vec![2, 3, 4, 5, 9]);
    }

    #[test]
    fn reposition_into_middle() {
        let (mut seq, handles) = cells(&[1, 2, 3, 4, 5]);
        handles[0].set(4);
        assert_eq!(seq.reposition(0), Some((0, 3)));
        let keys: Vec<i32> = seq.iter().map(|c| c.get()).collect();
        assert_eq!(keys, vec![2, 3, 4, 4, 5]);
        assert!(seq.is_sorted());
    }

    #[test]
    fn reposition_unchanged_is_noop() {
        let (mut seq, _handles) = cells(&[1, 2, 3, 4, 5]);
        assert_eq!(seq.reposition(1), None);
        assert_eq!(seq.reposition(9), None);
    }

    #[test]
    fn repair_restores_order_after_stale_insert() {
        let (mut seq, handles) = cells(&[1, 2, 3]);
        // Key changes silently, then an insert scans against it.
        handles[0].set(10);
        seq.insert(Arc::new(Cell(AtomicI32::new(5))));
        assert_eq!(seq.reposition(1), Some((1, 3)));
        assert!(!seq.is_sorted());

        assert_eq!(seq.repair(), vec![(1, 0), (2, 1)]);
        let keys: Vec<i32> = seq.iter().map(|c| c.get()).collect();
        assert_eq!(keys, vec![2, 3, 5, 10]);
        assert!(seq.is_sorted());
    }

    #[test]
    fn repair_keeps_equal_items_stable() {
        let mut seq: OrderedSequence<(i32, &'static str)> =
            OrderedSequence::new(Order::by_key(|(k, _): &(i32, &'static str)| *k));
        seq.insert(Arc::new((1, "a")));
        seq.insert(Arc::new((2, "b")));
        seq.replace_at(1, Arc::new((1, "c"))).unwrap();
        seq.replace_at(0, Arc::new((3, "d"))).unwrap();
        // [3d, 1c]
        assert_eq!(seq.repair(), vec![(1, 0)]);
        let tags: Vec<&str> = seq.iter().map(|e| e.1).collect();
        assert_eq!(tags, vec!["c", "d"]);
        assert!(seq.repair().is_empty());
    }

    #[test]
    fn identity_distinguishes_equal_values() {
        let mut seq = natural();
        let a = Arc::new(7);
        let b = Arc::new(7);
        seq.insert(Arc::clone(&a));
        seq.insert(Arc::clone(&b));

        assert_eq!(seq.position_by_identity(identity_of::<i32>(&b)), Some(1));
        assert_eq!(seq.count_identity(identity_of::<i32>(&a)), 1);
        // Equality still finds the first match.
        assert_eq!(seq.position_of(&7), Some(0));
    }

    #[test]
    fn first_misplaced_finds_out_of_order_slot() {
        let (mut seq, handles) = cells(&[1, 2, 3]);
        seq.insert(Arc::clone(&handles[0]));
        // [1,1,2,3] where both 1s are the same element
        handles[0].set(5);
        let id = identity_of::<Cell>(&handles[0]);
        assert_eq!(seq.count_identity(id), 2);
        assert_eq!(seq.first_misplaced(id), Some(1));
    }

    #[test]
    fn clear_returns_items_in_order() {
        let mut seq = natural();
        for v in [3, 1, 2] {
            seq.insert(Arc::new(v));
        }
        let drained: Vec<i32> = seq.clear().into_iter().map(|v| *v).collect();
        assert_eq!(drained, vec![1, 2, 3]);
        assert!(seq.is_empty());
    }
}
