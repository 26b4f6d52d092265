//! # sortline-types
//!
//! Shared vocabulary for the sortline sorted observable collection.
//!
//! This crate provides the foundational types used across all sortline crates:
//! - [`CollectionEvent`] - Structural change notifications (add/remove/move/...)
//! - [`ObserverId`], [`SubscriptionId`] - Registration handles
//! - [`Element`], [`ChangeSource`], [`ChangeNotifier`] - The optional capability
//!   an element uses to report that one of its attributes changed
//! - [`CollectionError`], [`ConfigError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod element;
mod error;
mod event;
mod ids;

pub use element::{ChangeListener, ChangeNotifier, ChangeSource, Element};
pub use error::{CollectionError, ConfigError};
pub use event::CollectionEvent;
pub use ids::{ObserverId, SubscriptionId};
