//! New offers on shop listing pages.

use crate::comparison::screenshot_url;
use crate::html::anchors;
use crate::{Fetcher, HttpClient, ListingSource};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;
use watcher_core::{FetchError, Observation, Sample};

/// Links on `page_url` whose text mentions one of `keywords`.
///
/// Returns `(absolute url, link text)` pairs; hrefs that cannot be resolved
/// are dropped.
pub fn matching_links(html: &str, page_url: &Url, keywords: &[String]) -> Vec<(String, String)> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    anchors(html)
        .into_iter()
        .filter(|a| {
            let text = a.text.to_lowercase();
            keywords.iter().any(|k| text.contains(k.as_str()))
        })
        .filter_map(|a| {
            let absolute = page_url.join(&a.href).ok()?;
            matches!(absolute.scheme(), "http" | "https").then(|| (absolute.to_string(), a.text))
        })
        .collect()
}

/// Build the observation for one listing page: absolute url -> link text.
pub fn listing_observation(source: &ListingSource, page_url: &Url, html: &str) -> Observation {
    matching_links(html, page_url, &source.keywords)
        .into_iter()
        .map(|(url, text)| {
            let sample = Sample::new(text)
                .with_label(source.name.as_str())
                .with_url(url.as_str())
                .with_details(vec![screenshot_url(&url)]);
            (url, sample)
        })
        .collect()
}

/// Scans listing pages for links matching the watched product.
pub struct ListingFetcher {
    sources: Vec<ListingSource>,
    http: HttpClient,
}

impl ListingFetcher {
    pub fn new(sources: Vec<ListingSource>, http: HttpClient) -> Self {
        Self { sources, http }
    }

    async fn scan(&self, source: &ListingSource) -> Result<Observation, FetchError> {
        let page_url = Url::parse(source.url.trim())
            .map_err(|e| FetchError::Config(format!("{}: {}", source.name, e)))?;
        let html = self.http.get_html(page_url.as_str()).await?;
        Ok(listing_observation(source, &page_url, &html))
    }
}

#[async_trait]
impl Fetcher for ListingFetcher {
    fn name(&self) -> &str {
        "listings"
    }

    async fn fetch(&self) -> Result<Observation, FetchError> {
        if self.sources.is_empty() {
            return Err(FetchError::Config("no listing pages configured".to_string()));
        }

        let mut observation = Observation::new();
        let mut last_error = None;
        let mut failed = 0;

        for source in &self.sources {
            match self.scan(source).await {
                Ok(found) => {
                    debug!(source = %source.name, links = found.len(), "Listing scanned");
                    for (url, sample) in found.iter() {
                        observation.insert(url.clone(), sample.clone());
                    }
                }
                Err(e) => {
                    warn!(source = %source.name, error = %e, "Listing unavailable");
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }

        if failed == self.sources.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        info!(pages = self.sources.len(), links = observation.len(), failed, "Listings checked");
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use watcher_core::WatchValue;

    const PAGE: &str = r#"
        <a href="/produkte/garmin-forerunner-965-black">Garmin Forerunner 965 Black</a>
        <a href="/produkte/polar-vantage">Polar Vantage V3</a>
        <a href="https://other.ch/forerunner">FORERUNNER deal</a>
        <a href="mailto:info@enjoy365.ch">Garmin support</a>
    "#;

    fn source() -> ListingSource {
        ListingSource {
            name: "Enjoy365".to_string(),
            url: "https://enjoy365.ch/alle-produkte/".to_string(),
            keywords: vec!["garmin".to_string(), "Forerunner".to_string()],
        }
    }

    #[test]
    fn test_matching_links_resolves_and_filters() {
        let page_url = Url::parse("https://enjoy365.ch/alle-produkte/").unwrap();
        let links = matching_links(PAGE, &page_url, &source().keywords);
        assert_eq!(
            links,
            vec![
                (
                    "https://enjoy365.ch/produkte/garmin-forerunner-965-black".to_string(),
                    "Garmin Forerunner 965 Black".to_string()
                ),
                (
                    "https://other.ch/forerunner".to_string(),
                    "FORERUNNER deal".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_listing_observation() {
        let page_url = Url::parse("https://enjoy365.ch/alle-produkte/").unwrap();
        let obs = listing_observation(&source(), &page_url, PAGE);
        assert_eq!(obs.len(), 2);

        let sample = obs
            .get("https://enjoy365.ch/produkte/garmin-forerunner-965-black")
            .unwrap();
        assert_eq!(
            sample.value,
            WatchValue::Text("Garmin Forerunner 965 Black".to_string())
        );
        assert_eq!(sample.label.as_deref(), Some("Enjoy365"));
        assert_eq!(
            sample.details[0],
            "https://image.thum.io/get/width/1200/https://enjoy365.ch/produkte/garmin-forerunner-965-black"
        );
    }

    #[test]
    fn test_no_matches_is_empty() {
        let page_url = Url::parse("https://enjoy365.ch/").unwrap();
        assert!(listing_observation(&source(), &page_url, "<p>nothing</p>").is_empty());
    }
}
