//! Core data types shared by every watcher bot.
//!
//! - `record` - persisted per-job state (`WatchRecord`, `WatchEntry`, `WatchValue`)
//! - `observation` - one run's snapshot of the external source
//! - `alert` - decisions produced by the evaluator
//! - `error` - fetch/notify/state error taxonomy

pub mod alert;
pub mod error;
pub mod observation;
pub mod record;

pub use alert::*;
pub use error::*;
pub use observation::*;
pub use record::*;
