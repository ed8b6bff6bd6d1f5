//! Error types for job runs.

use thiserror::Error;
use watcher_core::{FetchError, StateError};

/// Errors that fail a single job.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("State write failed: {0}")]
    State(#[from] StateError),
}

/// Result type for job runs.
pub type RunResult<T> = Result<T, RunError>;
