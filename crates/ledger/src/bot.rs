//! Poll → handle → reply → save offset.

use crate::{
    classify, confirmation, day_total, error_reply, help_text, parse_expense, summarize_day,
    summarize_stats, Command, Expense, ExpenseLedger, Input, LedgerState, ParseContext, ParseFlag,
    UpdateSource,
};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use watcher_alerts::Notifier;
use watcher_core::StateError;
use watcher_runner::{RunOutcome, RunResult, RunStatus};
use watcher_store::{JsonFileStore, DEFAULT_STATE_FILE};

const SOURCE: &str = "telegram";

/// The budget ledger bot for one chat.
pub struct BudgetBot {
    source: Box<dyn UpdateSource>,
    notifier: Arc<dyn Notifier>,
    chat_id: String,
    store: JsonFileStore<LedgerState>,
    ledger: ExpenseLedger,
    thb_to_chf: f64,
    dry_run: bool,
}

impl BudgetBot {
    /// Bot keeping `state.json` and `expenses.jsonl` in `data_dir`.
    pub fn new(
        source: Box<dyn UpdateSource>,
        notifier: Arc<dyn Notifier>,
        chat_id: impl Into<String>,
        data_dir: &Path,
        thb_to_chf: f64,
    ) -> Self {
        Self {
            source,
            notifier,
            chat_id: chat_id.into(),
            store: JsonFileStore::new(data_dir.join(DEFAULT_STATE_FILE)),
            ledger: ExpenseLedger::in_dir(data_dir),
            thb_to_chf,
            dry_run: false,
        }
    }

    /// Log replies instead of sending; write nothing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn poll(&self) -> RunResult<RunOutcome> {
        self.poll_at(Utc::now(), Local::now().date_naive()).await
    }

    /// Process all pending updates once.
    ///
    /// The stored offset only advances past updates that were fully handled.
    pub async fn poll_at(&self, now: DateTime<Utc>, today: NaiveDate) -> RunResult<RunOutcome> {
        let mut state = self.store.load();
        let updates = self.source.updates(state.next_offset()).await?;
        if updates.is_empty() {
            debug!(offset = state.next_offset(), "No pending updates");
            return Ok(RunOutcome::new(RunStatus::NoChange));
        }

        let mut expenses = self.ledger.load()?;
        let mut outcome = RunOutcome::new(RunStatus::NoChange);
        let mut replies = 0;

        for (index, update) in updates.iter().enumerate() {
            let message = match update.message() {
                Some(message) if message.chat.id.to_string() == self.chat_id.trim() => message,
                Some(message) => {
                    debug!(
                        update_id = update.update_id,
                        chat = message.chat.id,
                        "Ignoring foreign chat"
                    );
                    state.last_update_id = state.last_update_id.max(update.update_id);
                    continue;
                }
                None => {
                    state.last_update_id = state.last_update_id.max(update.update_id);
                    continue;
                }
            };

            let text = message.text.as_deref().unwrap_or("");
            // Distinct timestamps keep expense ids unique within one batch.
            let at = now + Duration::microseconds(index as i64);
            let reply = match self.handle_text(text, &mut state, &mut expenses, at, today) {
                Ok(reply) => reply,
                Err(e) => {
                    self.save_progress(&state);
                    return Err(e.into());
                }
            };
            state.last_update_id = state.last_update_id.max(update.update_id);

            let Some(reply) = reply else { continue };
            replies += 1;

            if self.dry_run {
                info!(update_id = update.update_id, "[DRY_RUN] Would send:\n{}", reply);
                continue;
            }
            match self.notifier.send(&reply).await {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    warn!(update_id = update.update_id, error = %e, "Failed to send reply");
                    outcome.undelivered += 1;
                }
            }
        }

        if self.dry_run {
            outcome.status = if replies == 0 {
                RunStatus::NoChange
            } else {
                RunStatus::WouldNotify(replies)
            };
            return Ok(outcome);
        }

        self.store.save(&state)?;
        if replies > 0 {
            outcome.status = RunStatus::Notify(replies);
        }
        info!(
            updates = updates.len(),
            replies,
            last_update_id = state.last_update_id,
            "Updates processed"
        );
        Ok(outcome)
    }

    /// Best-effort save before bailing out, so handled updates are not replayed.
    fn save_progress(&self, state: &LedgerState) {
        if self.dry_run {
            return;
        }
        if let Err(e) = self.store.save(state) {
            error!(error = %e, "Failed to save update offset");
        }
    }

    /// Reply for one chat message, if any.
    fn handle_text(
        &self,
        text: &str,
        state: &mut LedgerState,
        expenses: &mut Vec<Expense>,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Option<String>, StateError> {
        let reply = match classify(text) {
            Input::Empty => None,
            Input::Command(Command::Help) | Input::Unknown(_) => Some(help_text()),
            Input::Command(Command::Today) => Some(summarize_day(expenses, today)),
            Input::Command(Command::Stats(arg)) => {
                if arg.trim().eq_ignore_ascii_case("all") {
                    Some(summarize_stats(expenses))
                } else {
                    Some(summarize_day(expenses, today))
                }
            }
            Input::Command(Command::Exp(line)) if line.trim().is_empty() => Some(help_text()),
            Input::Command(Command::Exp(line)) | Input::Expense(line) => {
                Some(self.record(&line, state, expenses, now, today)?)
            }
        };
        Ok(reply)
    }

    fn record(
        &self,
        line: &str,
        state: &mut LedgerState,
        expenses: &mut Vec<Expense>,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<String, StateError> {
        let ctx = ParseContext {
            today,
            now,
            thb_to_chf: self.thb_to_chf,
        };
        let expense = match parse_expense(line, &ctx, SOURCE) {
            Ok(expense) => expense,
            Err(e) => {
                debug!(error = %e, "Unparseable expense");
                return Ok(error_reply(&e.to_string()));
            }
        };

        if !self.dry_run {
            self.ledger.append(&expense)?;
        }
        info!(
            id = %expense.id,
            amount_chf = expense.amount_chf,
            category = %expense.category,
            "Expense recorded"
        );

        let show_hint = expense.has_flag(ParseFlag::UsedDefaultCurrency)
            && !state.hints_shown.currency_default;
        if show_hint {
            state.hints_shown.currency_default = true;
        }

        let reply = {
            let mut total = day_total(expenses, today);
            if expense.date_iso == today {
                total += expense.amount_chf;
            }
            confirmation(&expense, total, show_hint)
        };
        expenses.push(expense);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Update;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use watcher_core::{FetchError, NotifyError};
    use watcher_runner::RunError;

    /// Mock update queue honoring the offset.
    struct MockUpdates {
        updates: Vec<Update>,
        should_fail: bool,
    }

    impl MockUpdates {
        fn with(updates: Vec<Update>) -> Self {
            Self {
                updates,
                should_fail: false,
            }
        }
    }

    #[async_trait]
    impl UpdateSource for MockUpdates {
        async fn updates(&self, offset: i64) -> Result<Vec<Update>, FetchError> {
            if self.should_fail {
                return Err(FetchError::Timeout("getUpdates".to_string()));
            }
            Ok(self
                .updates
                .iter()
                .filter(|u| u.update_id >= offset)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MockNotifier {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn update(id: i64, chat: i64, text: &str) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": id,
            "message": {"chat": {"id": chat}, "text": text}
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 12, 9, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 12).unwrap()
    }

    fn bot(dir: &Path, source: MockUpdates, notifier: Arc<MockNotifier>) -> BudgetBot {
        BudgetBot::new(Box::new(source), notifier, "42", dir, 0.026)
    }

    #[tokio::test]
    async fn test_records_expenses_and_replies() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(MockNotifier::default());
        let source = MockUpdates::with(vec![
            update(10, 42, "1200 hotel 3 night"),
            update(11, 7, "999 misc"),
            update(12, 42, "/exp 450 ferry"),
            update(13, 42, "/today"),
        ]);
        let bot = bot(dir.path(), source, notifier.clone());

        let outcome = bot.poll_at(now(), today()).await.unwrap();
        assert_eq!(outcome.status, RunStatus::Notify(3));

        let sent = notifier.sent.lock().unwrap().clone();
        assert_eq!(
            sent[0],
            "✅ Saved: 1’200.00 CHF (hotel, 3 night)\n\
             📅 Today total: 1’200.00 CHF\n\
             ℹ️ Currency defaulted to CHF. Add 'thb' if needed."
        );
        assert_eq!(
            sent[1],
            "✅ Saved: 450.00 CHF (transport/ferry)\n📅 Today total: 1’650.00 CHF"
        );
        assert!(sent[2].starts_with("📊 Today (2026-02-12)\nTotal: 1’650.00 CHF"));

        let expenses = ExpenseLedger::in_dir(dir.path()).load().unwrap();
        assert_eq!(expenses.len(), 2);
        assert_ne!(expenses[0].id, expenses[1].id);

        let state: LedgerState = JsonFileStore::new(dir.path().join("state.json"))
            .try_load()
            .unwrap()
            .unwrap();
        assert_eq!(state.last_update_id, 13);
        assert!(state.hints_shown.currency_default);
    }

    #[tokio::test]
    async fn test_second_poll_uses_saved_offset() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(MockNotifier::default());
        let bot = bot(
            dir.path(),
            MockUpdates::with(vec![update(5, 42, "20 bus")]),
            notifier.clone(),
        );

        bot.poll_at(now(), today()).await.unwrap();
        let again = bot.poll_at(now(), today()).await.unwrap();

        assert_eq!(again.status, RunStatus::NoChange);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
        assert_eq!(ExpenseLedger::in_dir(dir.path()).load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_parse_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(MockNotifier::default());
        let bot = bot(
            dir.path(),
            MockUpdates::with(vec![update(1, 42, "koh tao dinner")]),
            notifier.clone(),
        );

        bot.poll_at(now(), today()).await.unwrap();
        assert_eq!(
            notifier.sent.lock().unwrap()[0],
            "⚠️ Error: No amount found. Provide e.g. 1200 or 1200.5"
        );
        assert!(ExpenseLedger::in_dir(dir.path()).load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_updates_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bot = bot(dir.path(), MockUpdates::with(Vec::new()), Arc::default());

        let outcome = bot.poll_at(now(), today()).await.unwrap();
        assert_eq!(outcome.status, RunStatus::NoChange);
        assert!(!dir.path().join("state.json").exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockUpdates::with(Vec::new());
        source.should_fail = true;
        let bot = bot(dir.path(), source, Arc::default());

        assert!(matches!(
            bot.poll_at(now(), today()).await,
            Err(RunError::Fetch(FetchError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(MockNotifier::default());
        let bot = bot(
            dir.path(),
            MockUpdates::with(vec![update(3, 42, "20 bus"), update(4, 42, "/stats all")]),
            notifier.clone(),
        )
        .with_dry_run(true);

        let outcome = bot.poll_at(now(), today()).await.unwrap();
        assert_eq!(outcome.status, RunStatus::WouldNotify(2));
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert!(!dir.path().join("state.json").exists());
        assert!(!dir.path().join("expenses.jsonl").exists());
    }
}
