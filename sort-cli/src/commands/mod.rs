//! CLI command implementations.

pub mod check;
pub mod replay;
pub mod stress;
