//! Telegram-driven travel expense ledger.
//!
//! The bot polls its own update queue, turns each chat message into an
//! expense or a report, and remembers the last processed update id so
//! every update is handled at most once.

pub mod bot;
pub mod command;
pub mod expense;
pub mod ledger;
pub mod report;
pub mod state;
pub mod updates;

pub use bot::*;
pub use command::*;
pub use expense::*;
pub use ledger::*;
pub use report::*;
pub use state::*;
pub use updates::*;
