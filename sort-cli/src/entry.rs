//! The element type scenarios operate on.

use sortline_types::{ChangeNotifier, ChangeSource, Element};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Attribute name reported when the score changes.
pub const SCORE: &str = "score";
/// Attribute name reported when the label changes.
pub const LABEL: &str = "label";

/// A named, scored entry. Ordered by score; equal by name.
pub struct Entry {
    name: String,
    score: AtomicI64,
    label: Mutex<String>,
    changes: ChangeNotifier,
}

impl Entry {
    pub fn new(name: impl Into<String>, score: i64) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            score: AtomicI64::new(score),
            label: Mutex::new(String::new()),
            changes: ChangeNotifier::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> i64 {
        self.score.load(Ordering::SeqCst)
    }

    pub fn label(&self) -> String {
        self.label.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Update the score and report it. Unchanged values are still reported.
    pub fn set_score(&self, score: i64) {
        self.score.store(score, Ordering::SeqCst);
        self.changes.notify(SCORE);
    }

    pub fn set_label(&self, label: impl Into<String>) {
        *self.label.lock().unwrap_or_else(PoisonError::into_inner) = label.into();
        self.changes.notify(LABEL);
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Element for Entry {
    fn change_source(&self) -> Option<&dyn ChangeSource> {
        Some(&self.changes)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("score", &self.score())
            .field("label", &self.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_notify_attribute_names() {
        let entry = Entry::new("a", 1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        entry
            .change_source()
            .unwrap()
            .subscribe(Arc::new(move |attr: &str| sink.lock().unwrap().push(attr.to_string())));

        entry.set_score(7);
        entry.set_label("gold");

        assert_eq!(entry.score(), 7);
        assert_eq!(entry.label(), "gold");
        assert_eq!(*seen.lock().unwrap(), vec![SCORE.to_string(), LABEL.to_string()]);
    }

    #[test]
    fn equality_is_by_name() {
        assert_eq!(*Entry::new("a", 1), *Entry::new("a", 2));
        assert_ne!(*Entry::new("a", 1), *Entry::new("b", 1));
    }
}
