//! Target and source configuration files.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),
}

/// Read and decode a JSON config file.
pub fn load_json_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// One watched storefront or product page.
///
/// Fields are optional at parse time so one broken entry does not reject
/// the whole file; `validate` reports it per target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: String,
    /// ISO currency the product page must quote (product pages only).
    #[serde(default)]
    pub currency_expected: Option<String>,
}

impl Target {
    pub fn id(&self) -> &str {
        self.id.trim()
    }

    /// Label for messages, falling back to the id.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.id())
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim().trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id().is_empty() || self.base_url().is_empty() {
            return Err(ConfigError::InvalidTarget(format!(
                "id and url are required (id={:?}, url={:?})",
                self.id, self.url
            )));
        }
        url::Url::parse(self.base_url())
            .map_err(|e| ConfigError::InvalidTarget(format!("{}: {}", self.id(), e)))?;
        Ok(())
    }
}

/// A named page for the price comparison job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSource {
    pub name: String,
    pub url: String,
}

/// A listing page scanned for new offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSource {
    pub name: String,
    pub url: String,
    /// Link text must contain one of these (case-insensitive).
    pub keywords: Vec<String>,
}

/// Config file of the price-deal bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDealConfig {
    /// Product name used in messages.
    pub product: String,
    /// Alert when the best price drops strictly below this (CHF).
    #[serde(default = "default_price_limit")]
    pub price_limit: f64,
    #[serde(default = "default_eur_to_chf")]
    pub eur_to_chf: f64,
    /// A source page only counts if it mentions one of these shops.
    #[serde(default = "default_allowed_shops")]
    pub allowed_shops: Vec<String>,
    #[serde(default)]
    pub sources: Vec<NamedSource>,
    #[serde(default)]
    pub listings: Vec<ListingSource>,
}

fn default_price_limit() -> f64 {
    400.0
}

fn default_eur_to_chf() -> f64 {
    0.97
}

fn default_allowed_shops() -> Vec<String> {
    [
        "digitec",
        "galaxus",
        "brack",
        "microspot",
        "amazon",
        "decathlon",
        "sportxx",
        "interdiscount",
        "mediamarkt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
