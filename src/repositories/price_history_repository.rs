use crate::error::RepositoryError;
use crate::models::{Observation, ObservationRow};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

/// Repository for the append-only price history
pub struct PriceHistoryRepository {
    pool: SqlitePool,
}

impl PriceHistoryRepository {
    /// Create a new PriceHistoryRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an observation for a tracked product
    pub async fn append(
        &self,
        url: &str,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<Observation, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::append_on(&mut conn, url, price, observed_at).await
    }

    /// Append on an existing connection or transaction.
    ///
    /// A single statement checks that the product exists and stores the later
    /// of `observed_at` and the newest timestamp already recorded for the url,
    /// so a url's series never goes backwards in acceptance order.
    pub async fn append_on(
        conn: &mut SqliteConnection,
        url: &str,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<Observation, RepositoryError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(RepositoryError::InvalidInput(format!(
                "price must not be negative, got {}",
                price
            )));
        }

        let row = sqlx::query_as::<_, ObservationRow>(
            r#"
            INSERT INTO price_history (url, price, timestamp)
            SELECT p.url, ?, MAX(?, COALESCE(
                (SELECT MAX(h.timestamp) FROM price_history h WHERE h.url = p.url),
                ?
            ))
            FROM products p
            WHERE p.url = ?
            RETURNING url, price, timestamp
            "#,
        )
        .bind(price.to_string())
        .bind(observed_at.timestamp_micros())
        .bind(observed_at.timestamp_micros())
        .bind(url)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(RepositoryError::Integrity(format!(
                "no tracked product for {}",
                url
            ))),
        }
    }

    /// All observations for a url, oldest first; ties keep insertion order
    pub async fn find_by_url(&self, url: &str) -> Result<Vec<Observation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT url, price, timestamp
            FROM price_history
            WHERE url = ?
            ORDER BY timestamp ASC, rowid ASC
            "#,
        )
        .bind(url)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Observation::try_from).collect()
    }
}
