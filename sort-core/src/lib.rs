//! # sortline-core
//!
//! Pure ordering logic for sortline (no locks, instant tests).
//!
//! This crate implements the ordering strategy, the position search and the
//! ordered sequence itself, without any locking or notification plumbing.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no threads, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about where an element lands
//!
//! Mutual exclusion, element subscriptions and observer delivery are layered
//! on top by `sortline-collection`, which owns an [`OrderedSequence`] behind
//! its lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod order;
pub mod position;
pub mod sequence;

pub use order::{Order, OrderSource};
pub use position::{find_position, Placement};
pub use sequence::{identity_of, OrderedSequence};
