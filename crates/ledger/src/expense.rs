//! One-line expense parsing.
//!
//! Tokens may come in any order. Each step consumes the first token it
//! recognises and passes the rest on: date, amount, currency, category,
//! hotel nights. Whatever is left becomes the note.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Fixed THB → CHF rate when none is configured.
pub const DEFAULT_THB_TO_CHF: f64 = 0.026;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("No amount found. Provide e.g. 1200 or 1200.5")]
    MissingAmount,

    #[error("Invalid EU date {0:?}. Use DD.MM.YY (e.g. 12.02.26)")]
    InvalidDate(String),

    #[error("Empty input")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Chf,
    Thb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hotel,
    Transport,
    Activity,
    Misc,
}

impl Category {
    /// Report order.
    pub const ALL: [Category; 4] = [
        Category::Hotel,
        Category::Transport,
        Category::Activity,
        Category::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hotel => "hotel",
            Category::Transport => "transport",
            Category::Activity => "activity",
            Category::Misc => "misc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markers for values the parser filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFlag {
    DateDefaultToday,
    UsedDefaultCurrency,
    UsedDefaultCategory,
    HotelDefaultNights,
}

/// One ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub date_iso: NaiveDate,
    pub date_input_raw: Option<String>,
    pub amount_original: f64,
    pub currency_original: Currency,
    pub amount_chf: f64,
    pub category: Category,
    pub subcategory: Option<String>,
    pub nights: Option<u32>,
    pub note: String,
    pub source: String,
    pub raw_input: String,
    #[serde(default)]
    pub flags: Vec<ParseFlag>,
}

impl Expense {
    pub fn has_flag(&self, flag: ParseFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// `hotel`, `transport/ferry`, ...
    pub fn category_label(&self) -> String {
        match &self.subcategory {
            Some(sub) => format!("{}/{}", self.category, sub),
            None => self.category.to_string(),
        }
    }
}

/// Inputs the parser must not read from the environment itself.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
    pub thb_to_chf: f64,
}

const HOTEL_TOKENS: &[&str] = &["hotel", "bungalow", "resort"];
const TRANSPORT_SUB: &[&str] = &["flight", "ferry", "bus"];
const CATEGORY_TOKENS: &[&str] = &["hotel", "transport", "activity", "misc"];

fn eu_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})\.(\d{2})\.(\d{2})$").expect("static regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d{1,2})?$").expect("static regex"))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_eu_date(token: &str) -> Result<NaiveDate, ParseError> {
    let invalid = || ParseError::InvalidDate(token.to_string());
    let caps = eu_date_re().captures(token).ok_or_else(invalid)?;
    let day: u32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let year: i32 = 2000 + caps[3].parse::<i32>().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

fn parse_relative_date(token: &str, today: NaiveDate) -> Option<NaiveDate> {
    match token.to_lowercase().as_str() {
        "today" => Some(today),
        "yesterday" => Some(today - Duration::days(1)),
        _ => None,
    }
}

/// Parse one chat line into an expense.
pub fn parse_expense(text: &str, ctx: &ParseContext, source: &str) -> Result<Expense, ParseError> {
    let raw = text.trim();
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut tokens: Vec<&str> = raw.split_whitespace().collect();
    let mut flags = Vec::new();

    // Date
    let date_pos = tokens
        .iter()
        .position(|t| parse_relative_date(t, ctx.today).is_some() || eu_date_re().is_match(t));
    let (date, date_input_raw) = match date_pos {
        Some(i) => {
            let token = tokens.remove(i);
            let day = match parse_relative_date(token, ctx.today) {
                Some(day) => day,
                None => parse_eu_date(token)?,
            };
            (Some(day), Some(token.to_string()))
        }
        None => (None, None),
    };
    let date_iso = match date {
        Some(day) => day,
        None => {
            flags.push(ParseFlag::DateDefaultToday);
            ctx.today
        }
    };

    // Amount
    let amount_pos = tokens
        .iter()
        .position(|t| amount_re().is_match(t))
        .ok_or(ParseError::MissingAmount)?;
    let amount: f64 = tokens
        .remove(amount_pos)
        .parse()
        .map_err(|_| ParseError::MissingAmount)?;
    let amount = round2(amount);

    // Currency
    let currency = match tokens
        .iter()
        .position(|t| matches!(t.to_lowercase().as_str(), "chf" | "thb"))
    {
        Some(i) => {
            let token = tokens.remove(i).to_lowercase();
            if token == "thb" {
                Currency::Thb
            } else {
                Currency::Chf
            }
        }
        None => {
            flags.push(ParseFlag::UsedDefaultCurrency);
            Currency::Chf
        }
    };

    // Category and transport subcategory
    let mut category = None;
    let mut subcategory: Option<String> = None;
    let mut rest = Vec::with_capacity(tokens.len());
    for token in tokens {
        let lower = token.to_lowercase();
        if category.is_none() && HOTEL_TOKENS.contains(&lower.as_str()) {
            category = Some(Category::Hotel);
            continue;
        }
        if subcategory.is_none() && TRANSPORT_SUB.contains(&lower.as_str()) {
            category = Some(Category::Transport);
            subcategory = Some(lower);
            continue;
        }
        if category.is_none() && CATEGORY_TOKENS.contains(&lower.as_str()) {
            category = Some(match lower.as_str() {
                "hotel" => Category::Hotel,
                "transport" => Category::Transport,
                "activity" => Category::Activity,
                _ => Category::Misc,
            });
            continue;
        }
        rest.push(token);
    }
    let category = category.unwrap_or_else(|| {
        flags.push(ParseFlag::UsedDefaultCategory);
        Category::Misc
    });

    // Hotel nights: "<int> night"
    let mut nights = None;
    let mut note_tokens = Vec::with_capacity(rest.len());
    let mut i = 0;
    while i < rest.len() {
        if category == Category::Hotel && nights.is_none() && i + 1 < rest.len() {
            if let Ok(n) = rest[i].parse::<u32>() {
                if rest[i + 1].eq_ignore_ascii_case("night") {
                    nights = Some(n);
                    i += 2;
                    continue;
                }
            }
        }
        note_tokens.push(rest[i]);
        i += 1;
    }
    let nights = if category == Category::Hotel {
        Some(nights.unwrap_or_else(|| {
            flags.push(ParseFlag::HotelDefaultNights);
            1
        }))
    } else {
        None
    };

    let amount_chf = match currency {
        Currency::Chf => amount,
        Currency::Thb => round2(amount * ctx.thb_to_chf),
    };

    Ok(Expense {
        id: format!("exp_{}", ctx.now.format("%Y%m%d%H%M%S%6f")),
        date_iso,
        date_input_raw,
        amount_original: amount,
        currency_original: currency,
        amount_chf,
        category,
        subcategory,
        nights,
        note: note_tokens.join(" "),
        source: source.to_string(),
        raw_input: raw.to_string(),
        flags,
    })
}
