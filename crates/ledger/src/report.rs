//! Daily summary, all-time stats and reply texts.

use crate::{Category, Expense};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Swiss formatting with apostrophe thousands separator: `1’234.56`.
pub fn swiss_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('’');
        }
        grouped.push(*c);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Sum of CHF amounts booked on `day`.
pub fn day_total(expenses: &[Expense], day: NaiveDate) -> f64 {
    expenses
        .iter()
        .filter(|e| e.date_iso == day)
        .map(|e| e.amount_chf)
        .sum()
}

struct Breakdown {
    total: f64,
    per_category: BTreeMap<Category, f64>,
    hotel_total: f64,
    hotel_nights: u32,
}

impl Breakdown {
    fn of<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Self {
        let mut breakdown = Breakdown {
            total: 0.0,
            per_category: BTreeMap::new(),
            hotel_total: 0.0,
            hotel_nights: 0,
        };
        for e in expenses {
            breakdown.total += e.amount_chf;
            *breakdown.per_category.entry(e.category).or_insert(0.0) += e.amount_chf;
            if e.category == Category::Hotel {
                breakdown.hotel_total += e.amount_chf;
                breakdown.hotel_nights += e.nights.unwrap_or(1);
            }
        }
        breakdown
    }

    fn category_lines(&self) -> Vec<String> {
        Category::ALL
            .iter()
            .filter_map(|c| {
                let amount = self.per_category.get(c).copied().unwrap_or(0.0);
                (amount.abs() > 0.0001).then(|| format!("- {}: {} CHF", c, swiss_money(amount)))
            })
            .collect()
    }

    fn hotel_avg(&self) -> Option<f64> {
        (self.hotel_nights > 0).then(|| self.hotel_total / f64::from(self.hotel_nights))
    }
}

pub fn summarize_day(expenses: &[Expense], day: NaiveDate) -> String {
    let items: Vec<&Expense> = expenses.iter().filter(|e| e.date_iso == day).collect();
    if items.is_empty() {
        return format!("📅 Today ({})\nNo entries yet.", day);
    }

    let breakdown = Breakdown::of(items);
    let mut lines = vec![
        format!("📊 Today ({})", day),
        format!("Total: {} CHF", swiss_money(breakdown.total)),
        String::new(),
        "Breakdown:".to_string(),
    ];
    lines.extend(breakdown.category_lines());
    if let Some(avg) = breakdown.hotel_avg() {
        lines.push(format!(
            "- hotel avg/night: {} CHF ({} night)",
            swiss_money(avg),
            breakdown.hotel_nights
        ));
    }
    lines.join("\n")
}

pub fn summarize_stats(expenses: &[Expense]) -> String {
    let (Some(first), Some(last)) = (
        expenses.iter().map(|e| e.date_iso).min(),
        expenses.iter().map(|e| e.date_iso).max(),
    ) else {
        return "📊 Stats\nNo entries yet.".to_string();
    };

    let breakdown = Breakdown::of(expenses);
    let days = (last - first).num_days() + 1;
    let avg_day = breakdown.total / days as f64;

    let mut lines = vec![
        "📊 Stats (all)".to_string(),
        format!("Period: {} → {} ({} day)", first, last, days),
        format!("Total: {} CHF", swiss_money(breakdown.total)),
        format!("Avg/day: {} CHF", swiss_money(avg_day)),
        String::new(),
        "Breakdown (total):".to_string(),
    ];
    lines.extend(breakdown.category_lines());
    if let Some(avg) = breakdown.hotel_avg() {
        lines.push(String::new());
        lines.push(format!("Hotel nights: {} night", breakdown.hotel_nights));
        lines.push(format!("Hotel avg/night: {} CHF", swiss_money(avg)));
    }
    lines.join("\n")
}

pub fn help_text() -> String {
    [
        "🤖 Travel Budget Bot (CHF main, THB secondary)",
        "",
        "Input (one line, any order):",
        "- amount: 1200 or 1200.5 (bot normalizes to 2 decimals)",
        "- optional date: DD.MM.YY or today / yesterday",
        "- optional currency: chf (default) or thb",
        "- categories:",
        "  hotel (also: bungalow, resort) + optional 'X night'",
        "  transport via: flight | ferry | bus",
        "  activity (only if you type 'activity')",
        "  misc (fallback)",
        "",
        "Examples:",
        "  1200.5 hotel 3 night koh tao",
        "  450 ferry",
        "  yesterday 60 misc coffee",
        "  11.02.26 180 bus",
        "",
        "Commands:",
        "/stats  /stats all  /today  /help",
        "",
        "Corrections (no edit/delete):",
        "Use a negative counter-entry + correct new entry (with explicit date).",
    ]
    .join("\n")
}

/// Reply after saving; `show_currency_hint` adds the one-time CHF note.
pub fn confirmation(expense: &Expense, today_total: f64, show_currency_hint: bool) -> String {
    let mut saved = format!(
        "✅ Saved: {} CHF ({}",
        swiss_money(expense.amount_chf),
        expense.category_label()
    );
    if expense.category == Category::Hotel {
        saved.push_str(&format!(", {} night", expense.nights.unwrap_or(1)));
    }
    saved.push(')');

    let mut lines = vec![saved, format!("📅 Today total: {} CHF", swiss_money(today_total))];
    if show_currency_hint {
        lines.push("ℹ️ Currency defaulted to CHF. Add 'thb' if needed.".to_string());
    }
    lines.join("\n")
}

pub fn error_reply(message: &str) -> String {
    format!("⚠️ Error: {}", message)
}
