//! Price scraping through a remote browser session.
//!
//! `PageFetcher` is the seam the monitor depends on; `BrowserFetcher` drives a
//! remote Chrome over the DevTools protocol.

pub mod browser;
pub mod cdp;
pub mod extract;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use browser::BrowserFetcher;
pub use extract::{ExtractionRules, NumberFormat};

/// Price and title read from a product page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: Decimal,
    pub title: String,
}

/// Errors raised by a single fetch. None of them are retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Expected page element did not render in time
    #[error("Timed out after {waited:?} waiting for {element}")]
    Timeout { element: String, waited: Duration },

    /// Extracted price text is not a decimal
    #[error("Could not parse price from {input:?}")]
    ParseFailure { input: String },

    /// Remote browser session could not be established or was lost
    #[error("Browser connection failed: {0}")]
    ConnectionFailure(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Fetches the current price and title for a product page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PriceQuote, FetchError>;
}
