//! Persisted watch state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single observed value.
///
/// Serialized untagged so state files read as plain JSON scalars
/// (`true`, `449.0`, `"in stock"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchValue {
    /// Availability / sale-active style condition.
    Flag(bool),
    /// Price or any other numeric quantity.
    Number(f64),
    /// Free-form value (listing title, stock text).
    Text(String),
}

impl WatchValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WatchValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WatchValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Non-finite numbers cannot round-trip through JSON.
    pub fn is_well_formed(&self) -> bool {
        match self {
            WatchValue::Number(n) => n.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for WatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchValue::Flag(b) => write!(f, "{}", b),
            WatchValue::Number(n) => write!(f, "{:.2}", n),
            WatchValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for WatchValue {
    fn from(value: bool) -> Self {
        WatchValue::Flag(value)
    }
}

impl From<f64> for WatchValue {
    fn from(value: f64) -> Self {
        WatchValue::Number(value)
    }
}

impl From<&str> for WatchValue {
    fn from(value: &str) -> Self {
        WatchValue::Text(value.to_string())
    }
}

impl From<String> for WatchValue {
    fn from(value: String) -> Self {
        WatchValue::Text(value)
    }
}

/// Stored state for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    /// Last observed value.
    pub value: WatchValue,
    /// Whether an alert was confirmed for exactly `value`.
    #[serde(default)]
    pub alerted: bool,
    /// When that alert went out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerted_at: Option<DateTime<Utc>>,
}

impl WatchEntry {
    /// Entry for a value that did not trigger an alert.
    pub fn observed(value: WatchValue) -> Self {
        Self {
            value,
            alerted: false,
            alerted_at: None,
        }
    }

    /// Entry for a value that triggered an alert at `at`.
    pub fn alerted(value: WatchValue, at: DateTime<Utc>) -> Self {
        Self {
            value,
            alerted: true,
            alerted_at: Some(at),
        }
    }

    /// True if an alert was already confirmed for this exact value.
    pub fn already_alerted_for(&self, value: &WatchValue) -> bool {
        self.alerted && &self.value == value
    }
}

/// Persisted state for one watch job: key -> entry.
///
/// Backed by a `BTreeMap` so serialization order is stable and an
/// unchanged record re-serializes byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchRecord {
    entries: BTreeMap<String, WatchEntry>,
}

impl WatchRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&WatchEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: WatchEntry) -> Option<WatchEntry> {
        self.entries.insert(key.into(), entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<WatchEntry> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WatchEntry)> {
        self.entries.iter()
    }

    /// Put `key` back to how it looked in `previous`.
    ///
    /// Used when an alert could not be delivered and must stay retryable:
    /// a key that did not exist before is removed again.
    pub fn restore_from(&mut self, previous: &WatchRecord, key: &str) {
        match previous.get(key) {
            Some(entry) => {
                self.entries.insert(key.to_string(), entry.clone());
            }
            None => {
                self.entries.remove(key);
            }
        }
    }
}

impl FromIterator<(String, WatchEntry)> for WatchRecord {
    fn from_iter<I: IntoIterator<Item = (String, WatchEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
