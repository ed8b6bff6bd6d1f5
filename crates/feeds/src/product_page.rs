//! Product page sale detection from schema.org `ld+json` offers.

use crate::html::{element_text_by_class, ld_json_blocks};
use crate::price::parse_price;
use crate::{Fetcher, HttpClient, Target};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use watcher_core::{FetchError, Observation, Sample};

/// Struck-through list price on Canyon-style product pages.
const ORIGINAL_PRICE_CLASS: &str = "productDescription__priceOriginal";

/// Prices closer than this are the same price.
const PRICE_EPSILON: f64 = 0.01;

/// Depth-first walk over every JSON object.
fn collect_objects<'a>(value: &'a Value, out: &mut Vec<&'a serde_json::Map<String, Value>>) {
    match value {
        Value::Object(map) => {
            out.push(map);
            for child in map.values() {
                collect_objects(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_objects(item, out);
            }
        }
        _ => {}
    }
}

fn is_product(node: &serde_json::Map<String, Value>) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("product"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case("product")),
        _ => false,
    }
}

/// Lowest offer price quoted in `currency` across all Product nodes.
pub fn extract_current_price(html: &str, currency: &str) -> Option<f64> {
    let mut candidates = Vec::new();

    for block in ld_json_blocks(html) {
        let Ok(parsed) = serde_json::from_str::<Value>(block) else {
            continue;
        };
        let mut nodes = Vec::new();
        collect_objects(&parsed, &mut nodes);

        for node in nodes.into_iter().filter(|n| is_product(n)) {
            let offers: Vec<&Value> = match node.get("offers") {
                Some(offer @ Value::Object(_)) => vec![offer],
                Some(Value::Array(list)) => list.iter().filter(|o| o.is_object()).collect(),
                _ => Vec::new(),
            };

            for offer in offers {
                let quoted = offer
                    .get("priceCurrency")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or("");
                if quoted != currency {
                    continue;
                }
                let raw = match offer.get("price") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => continue,
                };
                if let Some(price) = parse_price(&raw) {
                    candidates.push(price);
                }
            }
        }
    }

    candidates.into_iter().reduce(f64::min)
}

/// List price shown struck-through next to a sale price.
pub fn extract_original_price(html: &str) -> Option<f64> {
    element_text_by_class(html, "s", ORIGINAL_PRICE_CLASS).and_then(|text| parse_price(&text))
}

/// Build the single-key observation for a product page.
///
/// A page without a matching current price is unparseable, not "no sale".
pub fn product_observation(target: &Target, html: &str) -> Result<Observation, FetchError> {
    let currency = target
        .currency_expected
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| FetchError::Config(format!("{}: currency_expected is required", target.id())))?;

    let current = extract_current_price(html, currency).ok_or_else(|| {
        FetchError::Parse(format!("{}: no {} offer price on page", target.id(), currency))
    })?;
    let original = extract_original_price(html);

    let sale_active = matches!(original, Some(o) if o > current + PRICE_EPSILON);

    let mut details = vec![format!("Current: {:.2} {}", current, currency)];
    if let Some(original) = original {
        details.push(format!("Original: {:.2} {}", original, currency));
    }

    let sample = Sample::new(sale_active)
        .with_label(target.display_label())
        .with_url(target.url.trim())
        .with_details(details);

    Ok(Observation::new().with(target.id(), sample))
}

/// Watches a single product page for a struck-through list price.
pub struct ProductSaleFetcher {
    target: Target,
    http: HttpClient,
}

impl ProductSaleFetcher {
    pub fn new(target: Target, http: HttpClient) -> Self {
        Self { target, http }
    }
}

#[async_trait]
impl Fetcher for ProductSaleFetcher {
    fn name(&self) -> &str {
        self.target.id()
    }

    async fn fetch(&self) -> Result<Observation, FetchError> {
        self.target
            .validate()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        let html = self.http.get_html(self.target.url.trim()).await?;
        debug!(job = self.target.id(), bytes = html.len(), "Product page fetched");

        let observation = product_observation(&self.target, &html)?;
        if let Some(sample) = observation.get(self.target.id()) {
            info!(job = self.target.id(), sale_active = %sample.value, "Product page checked");
        }
        Ok(observation)
    }
}
