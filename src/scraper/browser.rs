use super::cdp::{CdpError, CdpSession, PageTarget};
use super::extract::clean_title;
use super::{FetchError, PageFetcher, PriceQuote};
use crate::config::ScraperConfig;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Delay between element lookups while a page renders
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Fetches prices by driving a remote browser over the DevTools protocol.
///
/// Every call opens its own session and closes it before returning.
pub struct BrowserFetcher {
    config: ScraperConfig,
}

impl BrowserFetcher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    async fn scrape(
        &self,
        session: &mut CdpSession,
        url: &str,
        deadline: Instant,
    ) -> Result<PriceQuote, FetchError> {
        let page = session.open_page().await?;
        session.navigate(&page, url).await?;
        debug!("Navigated to {}", url);

        let rules = &self.config.rules;
        let price_text = self
            .wait_for_text(session, &page, &rules.price_selector, deadline)
            .await?;
        let title_text = self
            .wait_for_text(session, &page, &rules.title_selector, deadline)
            .await?;

        let price = self.config.number_format.parse_price(&price_text)?;

        Ok(PriceQuote {
            price,
            title: clean_title(&title_text),
        })
    }

    async fn wait_for_text(
        &self,
        session: &mut CdpSession,
        page: &PageTarget,
        selector: &str,
        deadline: Instant,
    ) -> Result<String, FetchError> {
        loop {
            match session.query_text(page, selector).await {
                Ok(Some(text)) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => {}
                // The execution context is replaced while the page loads
                Err(CdpError::Command { message, .. }) => {
                    debug!("Lookup of {} not ready yet: {}", selector, message)
                }
                Err(e) => return Err(e.into()),
            }

            if Instant::now() + POLL_INTERVAL >= deadline {
                return Err(FetchError::Timeout {
                    element: selector.to_string(),
                    waited: self.config.fetch_timeout(),
                });
            }

            sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<PriceQuote, FetchError> {
        let endpoint = self.config.endpoint.as_deref().ok_or_else(|| {
            FetchError::ConnectionFailure("no scraper endpoint configured".to_string())
        })?;

        let mut session = CdpSession::connect(endpoint, self.config.connect_timeout()).await?;

        let limit = self.config.fetch_timeout();
        let deadline = Instant::now() + limit;
        let outcome = match timeout(limit, self.scrape(&mut session, url, deadline)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                element: format!("page load of {}", url),
                waited: limit,
            }),
        };

        session.close().await;

        match &outcome {
            Ok(quote) => info!("Fetched {} for {}", quote.price, url),
            Err(e) => warn!("Fetch of {} failed: {}", url, e),
        }

        outcome
    }
}
