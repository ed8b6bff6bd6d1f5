//! Price text parsing.

use regex::Regex;
use std::sync::OnceLock;

/// Currency a scraped price was tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Chf,
    Eur,
}

fn tagged_price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(CHF|EUR)\s?([0-9’'\s]+[.,][0-9]{2})").expect("static regex")
    })
}

fn two_decimals_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\d{2}$").expect("static regex"))
}

/// Parse a loosely formatted price ("1’299.00", "1.299,00", "CHF 49.-").
///
/// When both separators are present the last one is the decimal point.
/// A lone dot only counts as decimal when followed by exactly two digits.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .replace('\u{a0}', " ")
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            let (decimal, thousands) = if dot > comma { ('.', ',') } else { (',', '.') };
            cleaned.replace(thousands, "").replace(decimal, ".")
        }
        (None, Some(_)) => cleaned.replace(',', "."),
        (Some(_), None) => {
            if two_decimals_re().is_match(&cleaned) {
                cleaned
            } else {
                cleaned.replace('.', "")
            }
        }
        (None, None) => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a price that may be a JSON number or a numeric string.
pub fn json_price(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Extract every `CHF 123.45` / `EUR 1’234,50` from page text, in CHF.
pub fn extract_tagged_prices(text: &str, eur_to_chf: f64) -> Vec<f64> {
    tagged_price_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let currency = match &caps[1] {
                "EUR" => Currency::Eur,
                _ => Currency::Chf,
            };
            let digits: String = caps[2]
                .chars()
                .filter(|c| !matches!(c, '’' | '\'') && !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            let value = digits.parse::<f64>().ok()?;
            Some(match currency {
                Currency::Eur => value * eur_to_chf,
                Currency::Chf => value,
            })
        })
        .collect()
}
