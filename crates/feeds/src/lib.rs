//! Fetchers that turn external sources into `Observation`s.
//!
//! ## Architecture
//!
//! - `feed` - the `Fetcher` trait every source implements
//! - `http` - shared HTTP client (User-Agent, timeout, block detection, retries)
//! - `html` / `price` - scraping helpers
//! - `shopify`, `product_page`, `comparison`, `listing` - one fetcher per source family
//! - `target` - JSON target/config files

pub mod comparison;
pub mod feed;
pub mod html;
pub mod http;
pub mod listing;
pub mod price;
pub mod product_page;
pub mod shopify;
pub mod target;

pub use comparison::*;
pub use feed::*;
pub use http::*;
pub use listing::*;
pub use product_page::*;
pub use shopify::*;
pub use target::*;
