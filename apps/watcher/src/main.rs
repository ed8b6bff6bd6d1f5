//! Watcher Bots - scheduled change watchers and the budget ledger bot.
//!
//! Each invocation runs one bot to completion and exits; scheduling and
//! committing state back to storage happen outside.

mod bots;
mod config;

use clap::Parser;
use config::{BotKind, CliOverrides, Settings};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Watcher Bots CLI
#[derive(Parser, Debug)]
#[command(name = "watcher")]
#[command(about = "Idempotent change watchers with Telegram alerts", long_about = None)]
struct Args {
    /// Bot to run
    #[arg(value_enum)]
    bot: BotKind,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log alerts instead of sending them; write no state
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// State directory (overrides <BOT>_DATA_DIR and WATCHER_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Targets or bot config file (overrides <BOT>_TARGETS_FILE)
    #[arg(long)]
    targets: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            dry_run: self.dry_run,
            data_dir: self.data_dir.clone(),
            targets: self.targets.clone(),
        }
    }
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG wins over --log-level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env is fine; real deployments pass variables directly.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level);

    let settings = match Settings::resolve(args.bot, &args.overrides(), |name| {
        std::env::var(name).ok()
    }) {
        Ok(settings) => settings,
        Err(e) => {
            error!(bot = args.bot.slug(), error = %e, "Configuration error");
            std::process::exit(1);
        }
    };

    info!(
        bot = settings.bot.slug(),
        data_dir = %settings.data_dir.display(),
        dry_run = settings.dry_run,
        "Watcher starting"
    );

    let report = match bots::run(&settings).await {
        Ok(report) => report,
        Err(e) => {
            error!(bot = settings.bot.slug(), error = %e, "Bot failed to start");
            std::process::exit(1);
        }
    };

    info!(
        bot = settings.bot.slug(),
        failed = report.failed(),
        summary = %report.summary_lines().join(", "),
        "Run finished"
    );
    if report.failed() {
        std::process::exit(1);
    }
}
