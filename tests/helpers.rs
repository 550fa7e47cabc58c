#![allow(dead_code)]

use async_trait::async_trait;
use price_tracker::config::DatabaseConfig;
use price_tracker::database::{create_pool, run_migrations};
use price_tracker::scraper::{FetchError, PageFetcher, PriceQuote};
use price_tracker::services::PriceMonitor;
use price_tracker::store::PriceStore;
use price_tracker::AppState;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// SQLite database in a temporary directory with migrations applied
pub struct TestDatabase {
    pub pool: SqlitePool,
    pub store: Arc<PriceStore>,
    pub dir: TempDir,
}

pub fn database_config(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("prices.db").display()),
        max_connections: 5,
        acquire_timeout_secs: 10,
        idle_timeout_secs: 300,
        max_lifetime_secs: 600,
        busy_timeout_secs: 5,
        test_before_acquire: true,
    }
}

impl TestDatabase {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let pool = create_pool(&database_config(&dir))
            .await
            .expect("Failed to create test database pool");

        run_migrations(&pool, None)
            .await
            .expect("Failed to run migrations");

        Self {
            store: Arc::new(PriceStore::new(pool.clone())),
            pool,
            dir,
        }
    }

    /// Open a second pool on the same file, as a restarted process would
    pub async fn reopen(&self) -> SqlitePool {
        create_pool(&database_config(&self.dir))
            .await
            .expect("Failed to reopen test database")
    }

    pub fn monitor(&self, fetcher: Arc<StubFetcher>) -> PriceMonitor {
        PriceMonitor::new(fetcher, self.store.clone())
    }

    pub fn app_state(&self, fetcher: Arc<StubFetcher>) -> AppState {
        AppState::new(self.pool.clone(), fetcher)
    }
}

/// Fetcher returning scripted results per url and counting calls
#[derive(Default)]
pub struct StubFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Result<PriceQuote, FetchError>>>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful fetch for `url`
    pub fn push_quote(&self, url: &str, price: Decimal, title: &str) {
        self.push(
            url,
            Ok(PriceQuote {
                price,
                title: title.to_string(),
            }),
        );
    }

    pub fn push_error(&self, url: &str, error: FetchError) {
        self.push(url, Err(error));
    }

    fn push(&self, url: &str, result: Result<PriceQuote, FetchError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<PriceQuote, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(FetchError::ConnectionFailure(format!(
                    "no scripted response for {}",
                    url
                )))
            })
    }
}

/// Decimal from a string literal such as "55.00"
pub fn dec(value: &str) -> Decimal {
    value.parse().expect("valid decimal literal")
}
