use crate::config::PollerConfig;
use crate::error::AppResult;
use crate::models::PriceCheck;
use crate::services::PriceMonitor;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

/// Outcome of one pass over all tracked products
#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub checked: usize,
    pub failed: usize,
    pub reached: Vec<PriceCheck>,
}

/// Background task that refreshes every tracked product on an interval
pub struct RefreshPoller {
    monitor: Arc<PriceMonitor>,
    poll_interval: Duration,
    concurrency: usize,
}

impl RefreshPoller {
    /// Create a new poller
    pub fn new(monitor: Arc<PriceMonitor>, config: &PollerConfig) -> Self {
        Self {
            monitor,
            poll_interval: config.interval(),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start polling; runs until the task is dropped
    pub async fn start(self) {
        let mut interval = time::interval(self.poll_interval);
        info!("Refresh poller started, polling every {:?}", self.poll_interval);

        loop {
            interval.tick().await;

            match self.refresh_all().await {
                Ok(summary) => info!(
                    "Refreshed {} products ({} failed, {} at or below target)",
                    summary.checked,
                    summary.failed,
                    summary.reached.len()
                ),
                Err(e) => error!("Error in refresh poller: {}", e),
            }
        }
    }

    /// Refresh every tracked product once, at most `concurrency` at a time.
    ///
    /// A failed product is logged and counted; it does not stop the pass.
    pub async fn refresh_all(&self) -> AppResult<RefreshSummary> {
        let products = self.monitor.list_products().await?;

        if products.is_empty() {
            return Ok(RefreshSummary::default());
        }

        let results: Vec<_> = stream::iter(products)
            .map(|product| {
                let monitor = self.monitor.clone();
                async move {
                    let result = monitor.refresh_product(&product.url).await;
                    (product, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = RefreshSummary::default();
        for (product, result) in results {
            summary.checked += 1;
            match result {
                Ok(check) if check.target_reached => {
                    info!(
                        "\"{}\" is at {} (target {})",
                        check.product.name, check.observation.price, check.product.target_price
                    );
                    summary.reached.push(check);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Refresh of {} failed: {}", product.url, e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
