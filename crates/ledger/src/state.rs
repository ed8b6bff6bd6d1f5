//! Persisted bot state.

use serde::{Deserialize, Serialize};

/// One-time hints already shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintsShown {
    #[serde(default)]
    pub currency_default: bool,
}

/// `state.json` of the budget bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Highest update id already processed.
    #[serde(default)]
    pub last_update_id: i64,
    #[serde(default)]
    pub hints_shown: HintsShown,
}

impl LedgerState {
    /// `offset` for the next getUpdates call.
    pub fn next_offset(&self) -> i64 {
        self.last_update_id + 1
    }
}
