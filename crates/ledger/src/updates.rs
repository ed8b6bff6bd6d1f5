//! Telegram `getUpdates` polling.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use watcher_core::FetchError;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

/// The subset of an update the ledger reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub edited_message: Option<IncomingMessage>,
}

impl Update {
    /// New or edited message, whichever is present.
    pub fn message(&self) -> Option<&IncomingMessage> {
        self.message.as_ref().or(self.edited_message.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
    #[serde(default)]
    description: Option<String>,
}

/// Source of pending chat updates.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Updates with id >= `offset`, without long polling.
    async fn updates(&self, offset: i64) -> Result<Vec<Update>, FetchError>;
}

/// Bot API client for `getUpdates`.
pub struct TelegramUpdates {
    http_client: reqwest::Client,
    bot_token: String,
}

impl TelegramUpdates {
    pub fn new(bot_token: impl Into<String>) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            bot_token: bot_token.into(),
        })
    }
}

/// Decode a `getUpdates` body.
pub fn parse_updates(body: &str) -> Result<Vec<Update>, FetchError> {
    let response: UpdatesResponse = serde_json::from_str(body)?;
    if !response.ok {
        return Err(FetchError::Parse(format!(
            "getUpdates rejected: {}",
            response.description.unwrap_or_default()
        )));
    }
    Ok(response.result)
}

#[async_trait]
impl UpdateSource for TelegramUpdates {
    async fn updates(&self, offset: i64) -> Result<Vec<Update>, FetchError> {
        let url = format!("{}/bot{}/getUpdates", API_BASE, self.bot_token);
        let params = [("offset", offset.to_string()), ("timeout", "0".to_string())];

        let response = self
            .http_client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors embed the URL, which carries the token.
                let e = e.without_url();
                if e.is_timeout() {
                    FetchError::Timeout(e.to_string())
                } else {
                    FetchError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Connection(e.without_url().to_string()))?;
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: "getUpdates".to_string(),
            });
        }

        // Client errors carry {"ok": false, "description": ...}.
        let updates = parse_updates(&body)?;
        debug!(offset, count = updates.len(), "Updates fetched");
        Ok(updates)
    }
}
