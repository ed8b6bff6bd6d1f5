//! Telegram delivery for watcher alerts.
//!
//! This crate provides:
//! - the `Notifier` trait the runner sends through
//! - a teloxide-backed `TelegramNotifier`
//! - per-bot message templates

pub mod notifier;
pub mod telegram;
pub mod template;

pub use notifier::Notifier;
pub use telegram::{parse_recipient, TelegramNotifier};
pub use template::Template;
