//! Append-only JSONL expense ledger.

use crate::Expense;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use watcher_core::StateError;

pub const EXPENSES_FILE: &str = "expenses.jsonl";

/// One JSON `Expense` per line; corrections are negative entries.
#[derive(Debug, Clone)]
pub struct ExpenseLedger {
    path: PathBuf,
}

impl ExpenseLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger at `<data_dir>/expenses.jsonl`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(EXPENSES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, expense: &Expense) -> Result<(), StateError> {
        let mut line = serde_json::to_string(expense).map_err(|source| StateError::Serialize {
            path: self.path.clone(),
            source,
        })?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StateError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StateError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| StateError::io(&self.path, e))?;

        debug!(id = %expense.id, amount_chf = expense.amount_chf, "Expense appended");
        Ok(())
    }

    /// All expenses in file order; a missing file is an empty ledger.
    pub fn load(&self) -> Result<Vec<Expense>, StateError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StateError::io(&self.path, e)),
        };

        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|source| StateError::Corrupt {
                    path: self.path.clone(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_expense, ParseContext, DEFAULT_THB_TO_CHF};
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn expense(text: &str) -> Expense {
        let ctx = ParseContext {
            today: NaiveDate::from_ymd_opt(2026, 2, 12).unwrap(),
            now: Utc.with_ymd_and_hms(2026, 2, 12, 9, 0, 0).unwrap(),
            thb_to_chf: DEFAULT_THB_TO_CHF,
        };
        parse_expense(text, &ctx, "telegram").unwrap()
    }

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExpenseLedger::in_dir(dir.path());
        assert!(ledger.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExpenseLedger::in_dir(&dir.path().join("data"));

        let first = expense("450 ferry");
        let second = expense("-450 ferry");
        ledger.append(&first).unwrap();
        ledger.append(&second).unwrap();

        assert_eq!(ledger.load().unwrap(), vec![first, second]);
        let raw = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn test_corrupt_line_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExpenseLedger::in_dir(dir.path());
        fs::write(ledger.path(), "{not json}\n").unwrap();
        assert!(matches!(ledger.load(), Err(StateError::Corrupt { .. })));
    }
}
