//! Job wiring per bot.

use crate::config::{BotKind, Settings};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use watcher_alerts::template::DEFAULT_TOP_N;
use watcher_alerts::{Notifier, TelegramNotifier, Template};
use watcher_core::{FetchError, NotifyError};
use watcher_engine::Rule;
use watcher_feeds::{
    load_json_config, ConfigError, HttpClient, HttpConfig, ListingFetcher, PriceComparisonFetcher,
    PriceDealConfig, ProductSaleFetcher, ShopSaleFetcher, Target,
};
use watcher_ledger::{BudgetBot, TelegramUpdates};
use watcher_runner::{RunReport, Runner, WatchJob};

/// Errors that stop a bot before any job runs.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

pub async fn run(settings: &Settings) -> Result<RunReport, BotError> {
    if settings.bot == BotKind::Budget {
        return run_budget(settings).await;
    }

    let http = HttpClient::new(HttpConfig::default())?;
    let jobs = build_jobs(settings, &http)?;
    let runner = runner_for(settings)?;
    info!(
        bot = settings.bot.slug(),
        jobs = jobs.len(),
        dry_run = runner.is_dry_run(),
        "Starting run"
    );
    Ok(runner.run_all(&jobs).await)
}

fn runner_for(settings: &Settings) -> Result<Runner, NotifyError> {
    if settings.dry_run {
        return Ok(Runner::dry_run());
    }
    let telegram = settings
        .telegram
        .as_ref()
        .ok_or_else(|| NotifyError::MissingCredentials("TELEGRAM_BOT_TOKEN".to_string()))?;
    let notifier = TelegramNotifier::new(&telegram.token, &telegram.chat_id)?;
    Ok(Runner::new(Arc::new(notifier), settings.delivery_policy))
}

/// Jobs of a watcher bot, in run order.
///
/// A target that fails validation still becomes a job; its fetch fails and
/// the other targets run normally. Two jobs sharing a state file are a
/// config error.
pub fn build_jobs(settings: &Settings, http: &HttpClient) -> Result<Vec<WatchJob>, ConfigError> {
    let dir = settings.data_dir.as_path();
    let jobs = match settings.bot {
        BotKind::ShopSale => load_targets(&settings.targets_file)?
            .into_iter()
            .enumerate()
            .map(|(i, target)| {
                let id = job_id(&target, i);
                WatchJob::in_dir(
                    dir,
                    id,
                    Box::new(ShopSaleFetcher::new(target, http.clone())),
                    Rule::BecameTrue,
                    Template::ShopSale { top_n: DEFAULT_TOP_N },
                )
            })
            .collect(),
        BotKind::ProductSale => load_targets(&settings.targets_file)?
            .into_iter()
            .enumerate()
            .map(|(i, target)| {
                let id = job_id(&target, i);
                WatchJob::in_dir(
                    dir,
                    id,
                    Box::new(ProductSaleFetcher::new(target, http.clone())),
                    Rule::BecameTrue,
                    Template::ProductSale,
                )
            })
            .collect(),
        BotKind::PriceDeal => {
            price_deal_jobs(dir, load_json_config(&settings.targets_file)?, http)?
        }
        BotKind::Budget => Vec::new(),
    };
    ensure_distinct_state(&jobs)?;
    Ok(jobs)
}

/// `comparison` and `listings` jobs; each only when its list is non-empty.
fn price_deal_jobs(
    dir: &Path,
    config: PriceDealConfig,
    http: &HttpClient,
) -> Result<Vec<WatchJob>, ConfigError> {
    if config.sources.is_empty() && config.listings.is_empty() {
        return Err(ConfigError::InvalidTarget(
            "price-deal config has neither sources nor listings".to_string(),
        ));
    }

    let price_limit = config.price_limit;
    let listings = config.listings.clone();
    let mut jobs = Vec::with_capacity(2);
    if !config.sources.is_empty() {
        jobs.push(WatchJob::in_dir(
            dir,
            "comparison",
            Box::new(PriceComparisonFetcher::new(config, http.clone())),
            Rule::Decrease {
                below: Some(price_limit),
            },
            Template::PriceDeal,
        ));
    }
    if !listings.is_empty() {
        jobs.push(WatchJob::in_dir(
            dir,
            "listings",
            Box::new(ListingFetcher::new(listings, http.clone())),
            Rule::NewKey,
            Template::NewListing,
        ));
    }
    Ok(jobs)
}

/// Ids that sanitize to the same file name would overwrite each other's record.
fn ensure_distinct_state(jobs: &[WatchJob]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for job in jobs {
        if !seen.insert(job.store.path()) {
            return Err(ConfigError::InvalidTarget(format!(
                "duplicate target id {:?} (state file {})",
                job.id,
                job.store.path().display()
            )));
        }
    }
    Ok(())
}

fn load_targets(path: &Path) -> Result<Vec<Target>, ConfigError> {
    let targets: Vec<Target> = load_json_config(path)?;
    info!(path = %path.display(), count = targets.len(), "Targets loaded");
    Ok(targets)
}

fn job_id(target: &Target, index: usize) -> String {
    match target.id() {
        "" => format!("target-{}", index + 1),
        id => id.to_string(),
    }
}

async fn run_budget(settings: &Settings) -> Result<RunReport, BotError> {
    let telegram = settings
        .telegram
        .as_ref()
        .ok_or_else(|| NotifyError::MissingCredentials("BUDGET_TELEGRAM_BOT_TOKEN".to_string()))?;

    let updates = TelegramUpdates::new(telegram.token.clone())?;
    let notifier: Arc<dyn Notifier> =
        Arc::new(TelegramNotifier::new(&telegram.token, &telegram.chat_id)?);
    let bot = BudgetBot::new(
        Box::new(updates),
        notifier,
        telegram.chat_id.clone(),
        &settings.data_dir,
        settings.thb_to_chf,
    )
    .with_dry_run(settings.dry_run);

    let job = settings.bot.slug();
    let result = bot.poll().await;
    match &result {
        Ok(outcome) => info!(
            job,
            delivered = outcome.delivered,
            undelivered = outcome.undelivered,
            "{}: {}",
            job,
            outcome.status
        ),
        Err(e) => error!(job, error = %e, "{}: ERROR", job),
    }

    let mut report = RunReport::default();
    report.push(job, result);
    Ok(report)
}
