//! Structural change notifications.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A structural change committed to a collection.
///
/// Granular enough for a consumer to mirror the collection (a UI list, a
/// downstream index) without re-reading the whole sequence. Indices refer to
/// the sequence immediately after the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionEvent {
    /// An element was inserted at `index`.
    Added {
        /// Position of the new element.
        index: usize,
    },
    /// The element at `index` was removed.
    Removed {
        /// Position the element occupied.
        index: usize,
    },
    /// The element at `index` was replaced in place.
    Replaced {
        /// Position of the replaced slot.
        index: usize,
    },
    /// An element moved from `from` to `to`.
    Moved {
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
    },
    /// Every element was removed.
    Cleared,
}

impl CollectionEvent {
    /// Apply this event to a mirror of the collection.
    ///
    /// `Added` and `Replaced` take their value from `source`, which must be
    /// the collection's state right after the event. Returns `false` if the
    /// event does not fit the mirror (it is then left untouched).
    pub fn apply_to<V: Clone>(&self, mirror: &mut Vec<V>, source: &[V]) -> bool {
        match *self {
            CollectionEvent::Added { index } => match source.get(index) {
                Some(v) if index <= mirror.len() => {
                    mirror.insert(index, v.clone());
                    true
                }
                _ => false,
            },
            CollectionEvent::Removed { index } => {
                if index < mirror.len() {
                    mirror.remove(index);
                    true
                } else {
                    false
                }
            }
            CollectionEvent::Replaced { index } => match source.get(index) {
                Some(v) if index < mirror.len() => {
                    mirror[index] = v.clone();
                    true
                }
                _ => false,
            },
            CollectionEvent::Moved { from, to } => {
                if from < mirror.len() && to < mirror.len() {
                    let v = mirror.remove(from);
                    mirror.insert(to, v);
                    true
                } else {
                    false
                }
            }
            CollectionEvent::Cleared => {
                mirror.clear();
                true
            }
        }
    }
}

impl fmt::Display for CollectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionEvent::Added { index } => write!(f, "added at {}", index),
            CollectionEvent::Removed { index } => write!(f, "removed at {}", index),
            CollectionEvent::Replaced { index } => write!(f, "replaced at {}", index),
            CollectionEvent::Moved { from, to } => write!(f, "moved {} -> {}", from, to),
            CollectionEvent::Cleared => write!(f, "cleared"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_is_tagged() {
        let json = serde_json::to_string(&CollectionEvent::Moved { from: 4, to: 0 }).unwrap();
        assert_eq!(json, r#"{"kind":"moved","from":4,"to":0}"#);

        let json = serde_json::to_string(&CollectionEvent::Cleared).unwrap();
        assert_eq!(json, r#"{"kind":"cleared"}"#);
    }

    #[test]
    fn event_display() {
        assert_eq!(CollectionEvent::Added { index: 2 }.to_string(), "added at 2");
        assert_eq!(
            CollectionEvent::Moved { from: 1, to: 3 }.to_string(),
            "moved 1 -> 3"
        );
    }

    #[test]
    fn mirror_follows_events() {
        let mut mirror: Vec<u32> = Vec::new();

        assert!(CollectionEvent::Added { index: 0 }.apply_to(&mut mirror, &[5]));
        assert!(CollectionEvent::Added { index: 0 }.apply_to(&mut mirror, &[3, 5]));
        assert!(CollectionEvent::Moved { from: 1, to: 0 }.apply_to(&mut mirror, &[5, 3]));
        assert_eq!(mirror, vec![5, 3]);

        assert!(CollectionEvent::Replaced { index: 1 }.apply_to(&mut mirror, &[5, 9]));
        assert!(CollectionEvent::Removed { index: 0 }.apply_to(&mut mirror, &[9]));
        assert_eq!(mirror, vec![9]);

        assert!(CollectionEvent::Cleared.apply_to(&mut mirror, &[]));
        assert!(mirror.is_empty());
    }

    #[test]
    fn mismatched_event_leaves_mirror_untouched() {
        let mut mirror = vec![1, 2];
        assert!(!CollectionEvent::Removed { index: 5 }.apply_to(&mut mirror, &[1, 2]));
        assert!(!CollectionEvent::Moved { from: 0, to: 2 }.apply_to(&mut mirror, &[1, 2]));
        assert_eq!(mirror, vec![1, 2]);
    }
}
