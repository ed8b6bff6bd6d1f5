//! Run sequencing for watch jobs.
//!
//! Each job goes through load → fetch → evaluate → notify → save. Failures
//! are isolated per job and collected into a `RunReport`.

pub mod error;
pub mod job;
pub mod runner;

pub use error::*;
pub use job::*;
pub use runner::*;
