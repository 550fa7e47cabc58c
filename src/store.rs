//! Durable store of tracked products and their price history.
//!
//! `PriceStore` is the only component that talks to the database. Every write
//! is committed, and synced by the pool's `synchronous=FULL` setting, before
//! the call returns.

use crate::database::Database;
use crate::error::RepositoryError;
use crate::models::{Observation, Product};
use crate::repositories::{PriceHistoryRepository, ProductRepository};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;

pub struct PriceStore {
    database: Database,
    products: ProductRepository,
    history: PriceHistoryRepository,
}

impl PriceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            database: Database::new(pool.clone()),
            products: ProductRepository::new(pool.clone()),
            history: PriceHistoryRepository::new(pool),
        }
    }

    /// Insert or fully replace the product for `url`. Idempotent.
    pub async fn upsert_product(
        &self,
        url: &str,
        name: &str,
        target_price: Decimal,
    ) -> Result<Product, RepositoryError> {
        let product = self.products.upsert(url, name, target_price).await?;
        debug!("Upserted product {}", url);
        Ok(product)
    }

    /// Append an observation; `Integrity` if the url is not tracked
    pub async fn append_observation(
        &self,
        url: &str,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<Observation, RepositoryError> {
        let observation = self.history.append(url, price, observed_at).await?;
        debug!("Recorded {} for {}", observation.price, url);
        Ok(observation)
    }

    /// Upsert the product and record its first observation in one transaction
    pub async fn track_product(
        &self,
        url: &str,
        name: &str,
        target_price: Decimal,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<(Product, Observation), RepositoryError> {
        let mut tx = self.database.begin().await?;

        let product = ProductRepository::upsert_on(&mut tx, url, name, target_price).await?;
        let observation =
            PriceHistoryRepository::append_on(&mut tx, url, price, observed_at).await?;

        tx.commit().await?;
        debug!("Tracking {} at {}", url, observation.price);

        Ok((product, observation))
    }

    pub async fn find_product(&self, url: &str) -> Result<Option<Product>, RepositoryError> {
        self.products.find_by_url(url).await
    }

    /// All tracked products in insertion order
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.products.find_all().await
    }

    /// Observations for `url`, oldest first; empty if there are none
    pub async fn list_observations(&self, url: &str) -> Result<Vec<Observation>, RepositoryError> {
        self.history.find_by_url(url).await
    }
}
