//! Error taxonomy shared across bots.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// External source unreachable or unparseable. Fatal to the job.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Blocked by bot protection: {0}")]
    Blocked(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid source configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl FetchError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Connection(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Blocked(_) | FetchError::Parse(_) | FetchError::Config(_) => false,
        }
    }

    /// Delay before retry attempt number `attempt` (1-based).
    /// Returns None for errors that should not be retried.
    pub fn suggested_retry_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.is_transient() {
            return None;
        }
        Some(Duration::from_secs(3 * u64::from(attempt.max(1))))
    }
}

/// Message delivery failed. Recoverable; never aborts the run.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification API error: {0}")]
    Api(String),

    #[error("Notification network error: {0}")]
    Network(String),

    #[error("Message rejected: {0}")]
    Rejected(String),

    #[error("Missing notification credentials: {0}")]
    MissingCredentials(String),
}

/// Persisted record unreadable, corrupt, or unwritable.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize state for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::Io {
            path: path.into(),
            source,
        }
    }
}
