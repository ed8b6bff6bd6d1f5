//! Source fetcher trait.

use async_trait::async_trait;
use watcher_core::{FetchError, Observation};

/// Retrieves the current external state for one watch job.
///
/// Implementations must fail with a `FetchError` rather than return a
/// partial or empty observation when the source could not be read, so a
/// broken fetch is never mistaken for "everything disappeared".
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Fetch and parse the source.
    async fn fetch(&self) -> Result<Observation, FetchError>;
}

