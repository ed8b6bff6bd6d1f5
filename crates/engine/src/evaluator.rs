//! Condition evaluator.
//!
//! Deterministic and side-effect free: the caller supplies the clock and
//! receives the updated record plus the alerts to deliver.

use crate::Rule;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use watcher_core::{AlertEvent, Observation, ObservationError, WatchEntry, WatchRecord};

/// Result of evaluating one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Record to persist if every alert is delivered.
    pub record: WatchRecord,
    /// Newly qualifying changes, in key order.
    pub alerts: Vec<AlertEvent>,
    /// Set when the observation was rejected; `record` is then the input unchanged.
    pub skipped: Option<ObservationError>,
}

impl Evaluation {
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Keys that produced an alert.
    pub fn alert_keys(&self) -> impl Iterator<Item = &str> {
        self.alerts.iter().map(|a| a.key.as_str())
    }
}

/// Compare `observation` against `record` under `rule`.
pub fn evaluate(
    observation: &Observation,
    record: &WatchRecord,
    rule: &Rule,
    now: DateTime<Utc>,
) -> Evaluation {
    if let Err(reason) = observation.validate() {
        warn!(reason = %reason, "Skipping evaluation, stored state left unchanged");
        return Evaluation {
            record: record.clone(),
            alerts: Vec::new(),
            skipped: Some(reason),
        };
    }

    let mut updated = record.clone();
    let mut alerts = Vec::new();

    for (key, sample) in observation.iter() {
        let stored = record.get(key);

        if let Some(entry) = stored {
            if entry.already_alerted_for(&sample.value) {
                debug!(key = %key, value = %sample.value, "Already alerted for this value");
                continue;
            }
        }

        let previous = stored.map(|e| &e.value);
        match rule.assess(previous, &sample.value) {
            Some(reason) => {
                debug!(key = %key, reason = %reason, "Alert qualifies");
                alerts.push(AlertEvent::new(key.clone(), previous.cloned(), sample, reason));
                updated.insert(key.clone(), WatchEntry::alerted(sample.value.clone(), now));
            }
            None => {
                let unchanged = previous == Some(&sample.value);
                if !unchanged {
                    updated.insert(key.clone(), WatchEntry::observed(sample.value.clone()));
                }
            }
        }
    }

    Evaluation {
        record: updated,
        alerts,
        skipped: None,
    }
}
