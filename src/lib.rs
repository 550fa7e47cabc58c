//! Price Tracker Library
//!
//! Fetches product prices through a remote browser, keeps a durable price
//! history per product, and reports when a price reaches its target.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod scraper;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use database::Database;
use scraper::PageFetcher;
use services::PriceMonitor;
use std::sync::Arc;
use store::PriceStore;

/// Application state wiring the store and the monitor together
pub struct AppState {
    pub database: Database,
    pub store: Arc<PriceStore>,
    pub monitor: Arc<PriceMonitor>,
}

impl AppState {
    /// Create a new AppState around an open pool and a fetcher
    pub fn new(pool: sqlx::SqlitePool, fetcher: Arc<dyn PageFetcher>) -> Self {
        let database = Database::new(pool.clone());
        let store = Arc::new(PriceStore::new(pool));

        Self {
            database,
            monitor: Arc::new(PriceMonitor::new(fetcher, store.clone())),
            store,
        }
    }
}
