//! Flat-file state persistence for watcher bots.
//!
//! One JSON document per watch job, loaded fully at start and rewritten
//! fully (temp file + rename) at the end of a successful run.

pub mod json;
pub mod path;

pub use json::*;
pub use path::*;
