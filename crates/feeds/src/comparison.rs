//! Best price across price comparison pages.

use crate::html::page_text;
use crate::price::extract_tagged_prices;
use crate::{Fetcher, HttpClient, NamedSource, PriceDealConfig};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use watcher_core::{FetchError, Observation, Sample};

const SCREENSHOT_BASE: &str = "https://image.thum.io/get/width/1200/";

/// Rendered page preview for messages.
pub fn screenshot_url(url: &str) -> String {
    format!("{}{}", SCREENSHOT_BASE, url)
}

/// Lowest tagged price on a page, in CHF.
///
/// Pages that mention none of `allowed_shops` are ignored.
pub fn best_price(text: &str, allowed_shops: &[String], eur_to_chf: f64) -> Option<f64> {
    let lower = text.to_lowercase();
    let allowed = allowed_shops
        .iter()
        .any(|shop| !shop.is_empty() && lower.contains(&shop.to_lowercase()));
    if !allowed {
        return None;
    }

    extract_tagged_prices(text, eur_to_chf)
        .into_iter()
        .filter(|p| p.is_finite())
        .reduce(f64::min)
}

fn source_sample(product: &str, source: &NamedSource, price: f64) -> Sample {
    Sample::new(price)
        .with_label(product)
        .with_url(source.url.trim())
        .with_details(vec![screenshot_url(source.url.trim())])
}

/// Watches every configured comparison page for the cheapest offer.
///
/// Each source is one key. A source that fails or shows no usable price is
/// left out of the observation so its stored value survives.
pub struct PriceComparisonFetcher {
    config: PriceDealConfig,
    http: HttpClient,
}

impl PriceComparisonFetcher {
    pub fn new(config: PriceDealConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    async fn check_source(&self, source: &NamedSource) -> Result<Option<f64>, FetchError> {
        let html = self.http.get_html(source.url.trim()).await?;
        let text = page_text(&html);
        Ok(best_price(
            &text,
            &self.config.allowed_shops,
            self.config.eur_to_chf,
        ))
    }
}

#[async_trait]
impl Fetcher for PriceComparisonFetcher {
    fn name(&self) -> &str {
        "comparison"
    }

    async fn fetch(&self) -> Result<Observation, FetchError> {
        if self.config.sources.is_empty() {
            return Err(FetchError::Config("no comparison sources configured".to_string()));
        }

        let mut observation = Observation::new();
        let mut last_error = None;
        let mut failed = 0;

        for source in &self.config.sources {
            match self.check_source(source).await {
                Ok(Some(price)) => {
                    debug!(source = %source.name, price, "Best price found");
                    observation.insert(
                        source.name.clone(),
                        source_sample(&self.config.product, source, price),
                    );
                }
                Ok(None) => {
                    debug!(source = %source.name, "No allowed shop price on page");
                }
                Err(e) => {
                    warn!(source = %source.name, error = %e, "Source unavailable");
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }

        if failed == self.config.sources.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        info!(
            sources = self.config.sources.len(),
            priced = observation.len(),
            failed,
            "Comparison pages checked"
        );
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use watcher_core::WatchValue;

    fn shops() -> Vec<String> {
        vec!["digitec".to_string(), "brack".to_string()]
    }

    #[test]
    fn test_best_price_takes_minimum() {
        let text = "Digitec CHF 459.00 Brack CHF 1’049.00 Amazon EUR 400,00";
        let best = best_price(text, &shops(), 0.97).unwrap();
        assert!((best - 388.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_price_requires_allowed_shop() {
        assert_eq!(best_price("Random shop CHF 99.00", &shops(), 0.97), None);
    }

    #[test]
    fn test_best_price_without_prices() {
        assert_eq!(best_price("DIGITEC has it, call us", &shops(), 0.97), None);
    }

    #[test]
    fn test_source_sample() {
        let source = NamedSource {
            name: "Toppreise".to_string(),
            url: "https://www.toppreise.ch/p/1".to_string(),
        };
        let sample = source_sample("Forerunner 965", &source, 389.0);
        assert_eq!(sample.value, WatchValue::Number(389.0));
        assert_eq!(sample.label.as_deref(), Some("Forerunner 965"));
        assert_eq!(
            sample.details,
            vec!["https://image.thum.io/get/width/1200/https://www.toppreise.ch/p/1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_no_sources_is_config_error() {
        let config: PriceDealConfig = serde_json::from_str(r#"{"product": "x"}"#).unwrap();
        let http = HttpClient::new(Default::default()).unwrap();
        let fetcher = PriceComparisonFetcher::new(config, http);
        assert!(matches!(fetcher.fetch().await, Err(FetchError::Config(_))));
    }
}
