//! Shopify storefront sale detection via `/products.json`.

use crate::price::json_price;
use crate::{Fetcher, HttpClient, Target};
use async_trait::async_trait;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, info};
use watcher_core::{FetchError, Observation, Sample};

/// Shopify caps `limit` at 250 per page.
const PRODUCTS_PATH: &str = "/products.json?limit=250";

#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub price: serde_json::Value,
    #[serde(default)]
    pub compare_at_price: serde_json::Value,
}

impl Variant {
    fn numeric_id(&self) -> u64 {
        match &self.id {
            serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
            serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

/// One discounted variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    pub title: String,
    pub url: String,
    pub variant_id: u64,
    pub price: f64,
    pub compare_at: f64,
    pub discount_abs: f64,
    pub discount_pct: f64,
}

impl Deal {
    /// Three-line bullet used in notifications.
    pub fn line(&self) -> String {
        format!(
            "• {}\n  {:.2} → {:.2}  (-{:.2} / {:.1}%)\n  {}",
            self.title, self.compare_at, self.price, self.discount_abs, self.discount_pct, self.url
        )
    }
}

/// Returns (absolute, percent) discount; percent is 0 for a non-positive base.
pub fn calc_discount(compare_at: f64, price: f64) -> (f64, f64) {
    let abs = compare_at - price;
    if compare_at <= 0.0 {
        return (abs, 0.0);
    }
    (abs, abs / compare_at * 100.0)
}

/// Deals found on a storefront.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealSummary {
    pub deals: Vec<Deal>,
    pub discounted_products: usize,
    pub discounted_variants: usize,
}

/// Collect discounted variants, de-duplicated by variant id.
pub fn collect_deals(products: &[Product], base_url: &str) -> DealSummary {
    let home_url = format!("{}/", base_url);
    let mut summary = DealSummary::default();
    let mut seen = HashSet::new();

    for product in products {
        let title = product
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Product");
        let url = match product.handle.as_deref().filter(|h| !h.is_empty()) {
            Some(handle) => format!("{}/products/{}", base_url, handle),
            None => home_url.clone(),
        };

        let mut product_has_discount = false;
        for variant in &product.variants {
            let (Some(price), Some(cap)) = (
                json_price(&variant.price),
                json_price(&variant.compare_at_price),
            ) else {
                continue;
            };

            let variant_id = variant.numeric_id();
            if !seen.insert(variant_id) {
                continue;
            }

            if cap > price {
                product_has_discount = true;
                summary.discounted_variants += 1;
                let (discount_abs, discount_pct) = calc_discount(cap, price);
                summary.deals.push(Deal {
                    title: title.to_string(),
                    url: url.clone(),
                    variant_id,
                    price,
                    compare_at: cap,
                    discount_abs,
                    discount_pct,
                });
            }
        }

        if product_has_discount {
            summary.discounted_products += 1;
        }
    }

    summary
}

/// Percent desc, absolute desc, price asc, variant id asc.
pub fn rank_deals(deals: &mut [Deal]) {
    deals.sort_by(|a, b| {
        b.discount_pct
            .partial_cmp(&a.discount_pct)
            .unwrap_or(Ordering::Equal)
            .then(
                b.discount_abs
                    .partial_cmp(&a.discount_abs)
                    .unwrap_or(Ordering::Equal),
            )
            .then(a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal))
            .then(a.variant_id.cmp(&b.variant_id))
    });
}

/// Build the single-key observation for a storefront.
pub fn sale_observation(target: &Target, products: &[Product]) -> Observation {
    let base_url = target.base_url();
    let mut summary = collect_deals(products, base_url);
    rank_deals(&mut summary.deals);

    let sale_active = !summary.deals.is_empty();
    let sample = Sample::new(sale_active)
        .with_label(target.display_label())
        .with_url(format!("{}/", base_url))
        .with_note(format!(
            "Discounted products: {}\nDiscounted variants: {}",
            summary.discounted_products, summary.discounted_variants
        ))
        .with_details(summary.deals.iter().map(Deal::line).collect());

    Observation::new().with(target.id(), sample)
}

/// Watches a Shopify store for any discounted variant.
pub struct ShopSaleFetcher {
    target: Target,
    http: HttpClient,
}

impl ShopSaleFetcher {
    pub fn new(target: Target, http: HttpClient) -> Self {
        Self { target, http }
    }
}

#[async_trait]
impl Fetcher for ShopSaleFetcher {
    fn name(&self) -> &str {
        self.target.id()
    }

    async fn fetch(&self) -> Result<Observation, FetchError> {
        self.target
            .validate()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        let url = format!("{}{}", self.target.base_url(), PRODUCTS_PATH);
        let response: ProductsResponse = self.http.get_json(&url).await?;
        debug!(job = self.target.id(), products = response.products.len(), "Products fetched");

        let observation = sale_observation(&self.target, &response.products);
        if let Some(sample) = observation.get(self.target.id()) {
            info!(
                job = self.target.id(),
                sale_active = %sample.value,
                deals = sample.details.len(),
                "Storefront checked"
            );
        }
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use watcher_core::WatchValue;

    fn products() -> Vec<Product> {
        let json = r#"{"products": [
            {"title": "Hoodie", "handle": "hoodie", "variants": [
                {"id": 1, "price": "60.00", "compare_at_price": "80.00"},
                {"id": 2, "price": "80.00", "compare_at_price": "80.00"}
            ]},
            {"title": "Cap", "handle": "cap", "variants": [
                {"id": 3, "price": "15.00", "compare_at_price": "30.00"},
                {"id": 1, "price": "1.00", "compare_at_price": "99.00"}
            ]},
            {"title": "Socks", "handle": "", "variants": [
                {"id": 4, "price": "10.00", "compare_at_price": null}
            ]},
            {"handle": "bag", "variants": [
                {"id": "5", "price": 90, "compare_at_price": 100}
            ]}
        ]}"#;
        serde_json::from_str::<ProductsResponse>(json).unwrap().products
    }

    fn target() -> Target {
        Target {
            id: "mnstry".to_string(),
            label: Some("MNSTRY".to_string()),
            url: "https://mnstry.com/".to_string(),
            currency_expected: None,
        }
    }

    #[test]
    fn test_calc_discount() {
        assert_eq!(calc_discount(80.0, 60.0), (20.0, 25.0));
        assert_eq!(calc_discount(0.0, -5.0), (5.0, 0.0));
    }

    #[test]
    fn test_collect_deals_dedupes_and_counts() {
        let summary = collect_deals(&products(), "https://mnstry.com");
        assert_eq!(summary.discounted_variants, 3);
        assert_eq!(summary.discounted_products, 3);
        let ids: Vec<u64> = summary.deals.iter().map(|d| d.variant_id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert_eq!(summary.deals[2].title, "Product");
        assert_eq!(summary.deals[2].url, "https://mnstry.com/products/bag");
    }

    #[test]
    fn test_rank_deals() {
        let mut summary = collect_deals(&products(), "https://mnstry.com");
        rank_deals(&mut summary.deals);
        let ids: Vec<u64> = summary.deals.iter().map(|d| d.variant_id).collect();
        // 50% cap, 25% hoodie, 10% bag
        assert_eq!(ids, vec![3, 1, 5]);
    }

    #[test]
    fn test_rank_ties_prefer_cheaper_then_id() {
        let deal = |id: u64, price: f64| Deal {
            title: "t".into(),
            url: "u".into(),
            variant_id: id,
            price,
            compare_at: price * 2.0,
            discount_abs: 10.0,
            discount_pct: 50.0,
        };
        let mut deals = vec![deal(9, 20.0), deal(2, 10.0), deal(1, 10.0)];
        rank_deals(&mut deals);
        let ids: Vec<u64> = deals.iter().map(|d| d.variant_id).collect();
        assert_eq!(ids, vec![1, 2, 9]);
    }

    #[test]
    fn test_deal_line() {
        let summary = collect_deals(&products(), "https://mnstry.com");
        assert_eq!(
            summary.deals[0].line(),
            "• Hoodie\n  80.00 → 60.00  (-20.00 / 25.0%)\n  https://mnstry.com/products/hoodie"
        );
    }

    #[test]
    fn test_sale_observation() {
        let obs = sale_observation(&target(), &products());
        let sample = obs.get("mnstry").unwrap();
        assert_eq!(sample.value, WatchValue::Flag(true));
        assert_eq!(sample.label.as_deref(), Some("MNSTRY"));
        assert_eq!(sample.url.as_deref(), Some("https://mnstry.com/"));
        assert_eq!(sample.details.len(), 3);
        assert!(sample.details[0].starts_with("• Cap"));
    }

    #[test]
    fn test_no_deals_is_inactive_not_empty() {
        let obs = sale_observation(&target(), &[]);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs.get("mnstry").unwrap().value, WatchValue::Flag(false));
    }
}
