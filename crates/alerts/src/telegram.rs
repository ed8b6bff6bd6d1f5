//! Telegram delivery via teloxide.

use crate::Notifier;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use teloxide::RequestError;
use tracing::debug;
use watcher_core::NotifyError;

/// Numeric ids are chats; anything else is a public channel username.
pub fn parse_recipient(chat_id: &str) -> Result<Recipient, NotifyError> {
    let chat_id = chat_id.trim();
    if chat_id.is_empty() {
        return Err(NotifyError::MissingCredentials("TELEGRAM_CHAT_ID".to_string()));
    }
    if let Ok(id) = chat_id.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    let username = if chat_id.starts_with('@') {
        chat_id.to_string()
    } else {
        format!("@{}", chat_id)
    };
    Ok(Recipient::ChannelUsername(username))
}

fn map_request_error(err: RequestError) -> NotifyError {
    match err {
        RequestError::Api(api) => NotifyError::Rejected(api.to_string()),
        RequestError::Network(e) => NotifyError::Network(e.to_string()),
        other => NotifyError::Api(other.to_string()),
    }
}

/// Sends plain-text messages to one fixed chat.
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramNotifier {
    /// Create a notifier for the given bot token and chat.
    pub fn new(token: &str, chat_id: &str) -> Result<Self, NotifyError> {
        if token.trim().is_empty() {
            return Err(NotifyError::MissingCredentials("TELEGRAM_BOT_TOKEN".to_string()));
        }
        Ok(Self {
            bot: Bot::new(token.trim()),
            recipient: parse_recipient(chat_id)?,
        })
    }

    /// Get the underlying bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        if text.trim().is_empty() {
            return Err(NotifyError::Rejected("empty message".to_string()));
        }
        self.bot
            .send_message(self.recipient.clone(), text)
            .await
            .map_err(map_request_error)?;
        debug!(chars = text.len(), "Telegram message sent");
        Ok(())
    }
}
