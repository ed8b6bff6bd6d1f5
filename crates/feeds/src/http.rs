//! Shared HTTP access for all fetchers.

use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use watcher_core::FetchError;

/// Desktop browser User-Agent; several shops reject obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Markers of interstitial / captcha pages served instead of content.
pub const BLOCK_PATTERNS: &[&str] = &[
    "captcha",
    "cloudflare",
    "enable javascript",
    "unusual traffic",
    "access denied",
];

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Total attempts for transient failures (1 = no retry).
    pub max_attempts: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(25),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_attempts: 3,
        }
    }
}

/// True if the page looks like a bot-protection interstitial.
pub fn is_blocked_html(html: &str) -> bool {
    let lower = html.to_lowercase();
    BLOCK_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Thin wrapper over `reqwest::Client` with error mapping and retries.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Fetch an HTML page, rejecting bot-protection pages.
    pub async fn get_html(&self, url: &str) -> Result<String, FetchError> {
        let (body, _) = self.get_text(url).await?;
        if is_blocked_html(&body) {
            return Err(FetchError::Blocked(url.to_string()));
        }
        Ok(body)
    }

    /// Fetch and decode a JSON document.
    ///
    /// An HTML answer (typically a WAF page) is a parse error, not data.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let (body, content_type) = self.get_text(url).await?;
        let is_json = content_type
            .as_deref()
            .map(|ct| ct.to_lowercase().contains("json"))
            .unwrap_or(false);
        if !is_json {
            return Err(FetchError::Parse(format!(
                "Expected JSON from {}, got {}",
                url,
                content_type.as_deref().unwrap_or("no content type")
            )));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// GET with retries on transient errors. Returns (body, content type).
    pub async fn get_text(&self, url: &str) -> Result<(String, Option<String>), FetchError> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.get_once(url).await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < attempts => match e.suggested_retry_delay(attempt) {
                    Some(delay) => {
                        warn!(url = url, attempt = attempt, error = %e, "Request failed, retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<(String, Option<String>), FetchError> {
        debug!(url = url, "GET");
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok((body, content_type))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else if err.is_decode() {
        FetchError::Parse(err.to_string())
    } else {
        FetchError::Connection(err.to_string())
    }
}
