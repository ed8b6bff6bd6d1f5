//! Watch jobs and their outcomes.

use crate::RunError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use watcher_alerts::Template;
use watcher_core::WatchRecord;
use watcher_engine::Rule;
use watcher_feeds::Fetcher;
use watcher_store::{state_file_for, JsonFileStore};

/// One fetcher + rule + template with its own state file.
pub struct WatchJob {
    pub id: String,
    pub fetcher: Box<dyn Fetcher>,
    pub rule: Rule,
    pub template: Template,
    pub store: JsonFileStore<WatchRecord>,
}

impl WatchJob {
    pub fn new(
        id: impl Into<String>,
        fetcher: Box<dyn Fetcher>,
        rule: Rule,
        template: Template,
        store: JsonFileStore<WatchRecord>,
    ) -> Self {
        Self {
            id: id.into(),
            fetcher,
            rule,
            template,
            store,
        }
    }

    /// Job stored as `state_<id>.json` in `data_dir`.
    pub fn in_dir(
        data_dir: &Path,
        id: impl Into<String>,
        fetcher: Box<dyn Fetcher>,
        rule: Rule,
        template: Template,
    ) -> Self {
        let id = id.into();
        let store = JsonFileStore::new(state_file_for(data_dir, &id));
        Self::new(id, fetcher, rule, template, store)
    }
}

impl fmt::Debug for WatchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchJob")
            .field("id", &self.id)
            .field("fetcher", &self.fetcher.name())
            .field("rule", &self.rule)
            .field("template", &self.template)
            .field("state", &self.store.path())
            .finish()
    }
}

/// What to do with the alert marker when delivery fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Undelivered alerts stay retryable on the next run.
    #[default]
    ConfirmedSend,
    /// Keys are marked alerted even if delivery failed.
    BestEffort,
}

#[derive(Debug, Error, PartialEq)]
#[error("Unknown delivery policy {0:?} (expected \"confirmed\" or \"best-effort\")")]
pub struct UnknownPolicy(pub String);

impl FromStr for DeliveryPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" | "confirmed-send" => Ok(DeliveryPolicy::ConfirmedSend),
            "best-effort" | "besteffort" => Ok(DeliveryPolicy::BestEffort),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Result classification of one successful job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    NoChange,
    /// Alerts were handed to the notifier.
    Notify(usize),
    /// Dry run: alerts were rendered but not sent.
    WouldNotify(usize),
    /// Observation rejected; state untouched.
    Skipped,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::NoChange => f.write_str("NO_CHANGE"),
            RunStatus::Notify(n) => write!(f, "NOTIFY ({})", n),
            RunStatus::WouldNotify(n) => write!(f, "WOULD_NOTIFY ({})", n),
            RunStatus::Skipped => f.write_str("SKIPPED"),
        }
    }
}

/// Outcome of a job that completed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Alerts whose messages were all accepted.
    pub delivered: usize,
    /// Alerts with at least one failed message.
    pub undelivered: usize,
}

impl RunOutcome {
    pub fn new(status: RunStatus) -> Self {
        Self {
            status,
            delivered: 0,
            undelivered: 0,
        }
    }
}

/// Per-job results of one invocation.
#[derive(Debug, Default)]
pub struct RunReport {
    pub results: Vec<(String, Result<RunOutcome, RunError>)>,
}

impl RunReport {
    pub fn push(&mut self, job: impl Into<String>, result: Result<RunOutcome, RunError>) {
        self.results.push((job.into(), result));
    }

    /// True if any job failed; maps to a non-zero exit code.
    pub fn failed(&self) -> bool {
        self.results.iter().any(|(_, r)| r.is_err())
    }

    /// `"<job>: <STATUS>"` lines in run order.
    pub fn summary_lines(&self) -> Vec<String> {
        self.results
            .iter()
            .map(|(job, result)| match result {
                Ok(outcome) => format!("{}: {}", job, outcome.status),
                Err(_) => format!("{}: ERROR", job),
            })
            .collect()
    }
}
