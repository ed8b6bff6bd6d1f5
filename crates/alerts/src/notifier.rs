//! Outbound notification seam.

use async_trait::async_trait;
use watcher_core::NotifyError;

/// Delivers one rendered plain-text message.
///
/// `Ok` means the remote side accepted the message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

