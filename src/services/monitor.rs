use crate::error::{AppError, AppResult};
use crate::models::{Observation, PriceCheck, Product, TrackedProduct};
use crate::scraper::PageFetcher;
use crate::store::PriceStore;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::info;

type LockMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// One async lock per url, so a product never has two fetches in flight.
///
/// An entry lives only while some caller holds or waits for it.
#[derive(Default)]
struct UrlLocks {
    locks: LockMap,
}

/// Held lock for one url; the map entry is removed when the last user leaves
struct UrlGuard {
    url: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
}

impl UrlLocks {
    async fn acquire(&self, url: &str) -> UrlGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(url.to_string()).or_default().clone()
        };

        UrlGuard {
            url: url.to_string(),
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for UrlGuard {
    fn drop(&mut self) {
        // Release the mutex first so its Arc count reflects only the map and waiters
        self.guard.take();

        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(&self.url)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.url);
        }
    }
}

/// Tracks products: adds them, refreshes their price and checks targets
pub struct PriceMonitor {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<PriceStore>,
    in_flight: UrlLocks,
}

fn validate_url(url: &str) -> AppResult<()> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| AppError::Validation(format!("not an absolute URL: {}", url)))?;

    if !matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "URL must use http or https: {}",
            url
        )));
    }

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || url.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!("malformed URL: {}", url)));
    }

    Ok(())
}

impl PriceMonitor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: Arc<PriceStore>) -> Self {
        Self {
            fetcher,
            store,
            in_flight: UrlLocks::default(),
        }
    }

    /// Start tracking `url`, or replace its target if already tracked.
    ///
    /// Nothing is written unless the fetch succeeds.
    pub async fn add_product(&self, url: &str, target_price: Decimal) -> AppResult<TrackedProduct> {
        validate_url(url)?;
        if target_price.is_sign_negative() && !target_price.is_zero() {
            return Err(AppError::Validation(format!(
                "target price must not be negative, got {}",
                target_price
            )));
        }

        let _guard = self.in_flight.acquire(url).await;

        let quote = self.fetcher.fetch(url).await?;
        let (product, observation) = self
            .store
            .track_product(url, &quote.title, target_price, quote.price, Utc::now())
            .await?;

        info!(
            "Tracking \"{}\" ({}) at {}, target {}",
            product.name, product.url, observation.price, product.target_price
        );

        Ok(TrackedProduct {
            product,
            observation,
        })
    }

    /// Fetch the current price of a tracked product and record it.
    ///
    /// Unknown urls fail with `NotFound` before any network work.
    pub async fn refresh_product(&self, url: &str) -> AppResult<PriceCheck> {
        let _guard = self.in_flight.acquire(url).await;

        let product = self
            .store
            .find_product(url)
            .await?
            .ok_or_else(|| AppError::NotFound(url.to_string()))?;

        let quote = self.fetcher.fetch(url).await?;
        let observation = self
            .store
            .append_observation(url, quote.price, Utc::now())
            .await?;
        let target_reached = product.is_target_reached(observation.price);

        if target_reached {
            info!(
                "Target reached for \"{}\": {} <= {}",
                product.name, observation.price, product.target_price
            );
        } else {
            info!(
                "\"{}\" at {}, target {}",
                product.name, observation.price, product.target_price
            );
        }

        Ok(PriceCheck {
            product,
            observation,
            target_reached,
        })
    }

    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    /// Price history for `url`, oldest first
    pub async fn history(&self, url: &str) -> AppResult<Vec<Observation>> {
        Ok(self.store.list_observations(url).await?)
    }
}
