//! Alert decisions.

use crate::{Sample, WatchValue};
use std::fmt;

/// Why a key qualified for a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertReason {
    /// Key was not in the stored record.
    NewKey,
    /// Numeric value dropped (and is below the threshold, if any).
    Decreased { below: Option<f64> },
    /// Flag switched to `true`.
    BecameTrue,
    /// Value differs from the stored one.
    Changed,
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertReason::NewKey => f.write_str("new"),
            AlertReason::Decreased { below: Some(limit) } => {
                write!(f, "decreased below {:.2}", limit)
            }
            AlertReason::Decreased { below: None } => f.write_str("decreased"),
            AlertReason::BecameTrue => f.write_str("became true"),
            AlertReason::Changed => f.write_str("changed"),
        }
    }
}

/// A newly qualifying change, consumed by the notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub key: String,
    /// Stored value before this run (`None` for new keys).
    pub previous: Option<WatchValue>,
    pub current: WatchValue,
    pub reason: AlertReason,
    pub label: Option<String>,
    pub url: Option<String>,
    pub note: Option<String>,
    pub details: Vec<String>,
}

impl AlertEvent {
    pub fn new(
        key: impl Into<String>,
        previous: Option<WatchValue>,
        sample: &Sample,
        reason: AlertReason,
    ) -> Self {
        Self {
            key: key.into(),
            previous,
            current: sample.value.clone(),
            reason,
            label: sample.label.clone(),
            url: sample.url.clone(),
            note: sample.note.clone(),
            details: sample.details.clone(),
        }
    }

    /// Label if the fetcher provided one, otherwise the key.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}
