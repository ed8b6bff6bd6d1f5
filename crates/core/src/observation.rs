//! Ephemeral snapshot of an external source.

use crate::WatchValue;
use std::collections::BTreeMap;
use thiserror::Error;

/// Why an observation cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObservationError {
    #[error("observation is empty")]
    Empty,
    #[error("observation contains an empty key")]
    EmptyKey,
    #[error("non-finite value for key {0}")]
    NonFinite(String),
}

/// One observed key plus the context needed to render an alert for it.
///
/// Only `value` is ever persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub value: WatchValue,
    /// Human-readable name (product title, target label).
    pub label: Option<String>,
    /// Link to include in the notification.
    pub url: Option<String>,
    /// Free-form summary line (counts, totals).
    pub note: Option<String>,
    /// Pre-formatted detail lines (deal lines, price breakdown).
    pub details: Vec<String>,
}

impl Sample {
    pub fn new(value: impl Into<WatchValue>) -> Self {
        Self {
            value: value.into(),
            label: None,
            url: None,
            note: None,
            details: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

/// Current external values keyed like the `WatchRecord`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    samples: BTreeMap<String, Sample>,
}

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, sample: Sample) -> Option<Sample> {
        self.samples.insert(key.into(), sample)
    }

    /// Builder-style insert, handy in fetchers and tests.
    pub fn with(mut self, key: impl Into<String>, sample: Sample) -> Self {
        self.insert(key, sample);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Sample> {
        self.samples.get(key)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Sample)> {
        self.samples.iter()
    }

    /// Reject observations that would corrupt stored state if evaluated.
    pub fn validate(&self) -> Result<(), ObservationError> {
        if self.samples.is_empty() {
            return Err(ObservationError::Empty);
        }
        for (key, sample) in &self.samples {
            if key.trim().is_empty() {
                return Err(ObservationError::EmptyKey);
            }
            if !sample.value.is_well_formed() {
                return Err(ObservationError::NonFinite(key.clone()));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, Sample)> for Observation {
    fn from_iter<I: IntoIterator<Item = (String, Sample)>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
