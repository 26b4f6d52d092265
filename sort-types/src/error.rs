//! Error types for sortline.

use std::time::Duration;
use thiserror::Error;

/// Misconfiguration detected while building a collection.
///
/// Always reported by `build()`, never on first use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No ordering source was chosen.
    #[error("no ordering source: choose natural order, a comparator, or a key")]
    MissingOrder,

    /// More than one ordering source was chosen.
    #[error("conflicting ordering sources: {first} and {second}")]
    ConflictingOrder {
        /// The ordering source chosen first.
        first: &'static str,
        /// The ordering source that conflicts with it.
        second: &'static str,
    },

    /// The watched attribute name is empty.
    #[error("watched attribute name must not be empty")]
    EmptyWatchedAttribute,
}

/// Errors that can occur in collection operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Invalid configuration.
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    /// Index outside the current bounds.
    #[error("index {index} out of range (len: {len})")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The length at the time of the request.
        len: usize,
    },

    /// A critical section unwound; ordering and subscription state can no
    /// longer be trusted and the collection refuses further mutation.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// The lock could not be acquired within the configured bound.
    #[error("lock not acquired within {0:?}")]
    LockTimeout(Duration),
}

impl CollectionError {
    /// True for the "not found / out of range" family of results, which
    /// callers may choose not to treat as failures.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, CollectionError::OutOfRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CollectionError::OutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "index 7 out of range (len: 3)");
        assert!(err.is_out_of_range());
    }

    #[test]
    fn config_error_converts() {
        let err: CollectionError = ConfigError::MissingOrder.into();
        assert!(matches!(err, CollectionError::Config(ConfigError::MissingOrder)));
        assert!(err.to_string().starts_with("invalid config"));
        assert!(!err.is_out_of_range());
    }

    #[test]
    fn conflicting_order_names_both_sources() {
        let err = ConfigError::ConflictingOrder {
            first: "comparator",
            second: "key",
        };
        assert_eq!(
            err.to_string(),
            "conflicting ordering sources: comparator and key"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CollectionError>();
        assert_send_sync::<ConfigError>();
    }
}
