use crate::error::RepositoryError;
use crate::models::{Product, ProductRow};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

/// Repository for tracked products
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Create a new ProductRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a product or replace its name and target price
    pub async fn upsert(
        &self,
        url: &str,
        name: &str,
        target_price: Decimal,
    ) -> Result<Product, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_on(&mut conn, url, name, target_price).await
    }

    /// Upsert on an existing connection or transaction.
    ///
    /// `ON CONFLICT DO UPDATE` keeps the row in place, so history rows that
    /// reference it stay valid.
    pub async fn upsert_on(
        conn: &mut SqliteConnection,
        url: &str,
        name: &str,
        target_price: Decimal,
    ) -> Result<Product, RepositoryError> {
        if target_price.is_sign_negative() && !target_price.is_zero() {
            return Err(RepositoryError::InvalidInput(format!(
                "target price must not be negative, got {}",
                target_price
            )));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (url, name, target_price)
            VALUES (?, ?, ?)
            ON CONFLICT (url) DO UPDATE
            SET name = excluded.name, target_price = excluded.target_price
            RETURNING url, name, target_price
            "#,
        )
        .bind(url)
        .bind(name)
        .bind(target_price.to_string())
        .fetch_one(&mut *conn)
        .await?;

        row.try_into()
    }

    /// Find a product by URL
    pub async fn find_by_url(&self, url: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT url, name, target_price
            FROM products
            WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// All products in the order they were first added
    pub async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT url, name, target_price
            FROM products
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }
}
