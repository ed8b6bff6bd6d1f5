//! Alert decision engine.
//!
//! Compares a fresh `Observation` against the stored `WatchRecord` and
//! decides which keys newly warrant a notification.

pub mod evaluator;
pub mod rule;

pub use evaluator::*;
pub use rule::*;
