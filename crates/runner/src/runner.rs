//! Job sequencing: load → fetch → evaluate → notify → save.

use crate::{DeliveryPolicy, RunError, RunOutcome, RunReport, RunResult, RunStatus, WatchJob};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use watcher_alerts::Notifier;
use watcher_core::{AlertEvent, WatchRecord};
use watcher_engine::evaluate;

/// Where alerts go.
#[derive(Clone)]
enum Delivery {
    Send {
        notifier: Arc<dyn Notifier>,
        policy: DeliveryPolicy,
    },
    DryRun,
}

/// Drives watch jobs one after another.
#[derive(Clone)]
pub struct Runner {
    delivery: Delivery,
}

impl Runner {
    /// Runner that sends through `notifier` and persists state.
    pub fn new(notifier: Arc<dyn Notifier>, policy: DeliveryPolicy) -> Self {
        Self {
            delivery: Delivery::Send { notifier, policy },
        }
    }

    /// Runner that only logs what it would send and never writes state.
    pub fn dry_run() -> Self {
        Self {
            delivery: Delivery::DryRun,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self.delivery, Delivery::DryRun)
    }

    /// Run every job in order, logging one summary line per job.
    pub async fn run_all(&self, jobs: &[WatchJob]) -> RunReport {
        let mut report = RunReport::default();

        for job in jobs {
            let result = self.run_job(job).await;
            match &result {
                Ok(outcome) => info!(
                    job = %job.id,
                    delivered = outcome.delivered,
                    undelivered = outcome.undelivered,
                    "{}: {}",
                    job.id,
                    outcome.status
                ),
                Err(e) => error!(job = %job.id, error = %e, "{}: ERROR", job.id),
            }
            report.push(job.id.clone(), result);
        }

        report
    }

    pub async fn run_job(&self, job: &WatchJob) -> RunResult<RunOutcome> {
        self.run_job_at(job, Utc::now()).await
    }

    /// Run one job with an explicit clock value for `alerted_at`.
    pub async fn run_job_at(&self, job: &WatchJob, now: DateTime<Utc>) -> RunResult<RunOutcome> {
        let previous: WatchRecord = job.store.load();

        let observation = job.fetcher.fetch().await.map_err(RunError::Fetch)?;
        let evaluation = evaluate(&observation, &previous, &job.rule, now);

        if evaluation.is_skipped() {
            return Ok(RunOutcome::new(RunStatus::Skipped));
        }

        let alert_count = evaluation.alerts.len();

        let (notifier, policy) = match &self.delivery {
            Delivery::DryRun => {
                for alert in &evaluation.alerts {
                    for message in job.template.render(alert) {
                        info!(job = %job.id, key = %alert.key, "[DRY_RUN] Would send:\n{}", message);
                    }
                }
                let status = if alert_count == 0 {
                    RunStatus::NoChange
                } else {
                    RunStatus::WouldNotify(alert_count)
                };
                return Ok(RunOutcome::new(status));
            }
            Delivery::Send { notifier, policy } => (notifier, *policy),
        };

        let mut record = evaluation.record;
        let mut outcome = RunOutcome::new(if alert_count == 0 {
            RunStatus::NoChange
        } else {
            RunStatus::Notify(alert_count)
        });

        for alert in &evaluation.alerts {
            if deliver(notifier.as_ref(), job, alert).await {
                outcome.delivered += 1;
                continue;
            }

            outcome.undelivered += 1;
            match policy {
                DeliveryPolicy::ConfirmedSend => {
                    warn!(job = %job.id, key = %alert.key, "Delivery failed, alert stays pending");
                    record.restore_from(&previous, &alert.key);
                }
                DeliveryPolicy::BestEffort => {
                    warn!(job = %job.id, key = %alert.key, "Delivery failed, marking alerted anyway");
                }
            }
        }

        job.store.save(&record)?;
        Ok(outcome)
    }
}

/// Send every message of one alert; stops at the first failure.
///
/// The alert counts as delivered once its first message is accepted, so a
/// failed follow-up never re-sends the headline on the next run.
async fn deliver(notifier: &dyn Notifier, job: &WatchJob, alert: &AlertEvent) -> bool {
    for (index, message) in job.template.render(alert).iter().enumerate() {
        if let Err(e) = notifier.send(message).await {
            if index == 0 {
                error!(job = %job.id, key = %alert.key, error = %e, "Failed to send alert");
                return false;
            }
            warn!(
                job = %job.id,
                key = %alert.key,
                part = index + 1,
                error = %e,
                "Failed to send follow-up message"
            );
            return true;
        }
    }
    info!(job = %job.id, key = %alert.key, reason = %alert.reason, "Alert sent");
    true
}
