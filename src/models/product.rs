use crate::error::RepositoryError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// A tracked product, keyed by its page URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub url: String,
    pub name: String,
    pub target_price: Decimal,
}

impl Product {
    pub fn new(url: impl Into<String>, name: impl Into<String>, target_price: Decimal) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            target_price,
        }
    }

    /// A price at or below the target is the alert condition
    pub fn is_target_reached(&self, price: Decimal) -> bool {
        price <= self.target_price
    }
}

/// `products` row as stored; prices are kept as decimal text
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub url: String,
    pub name: String,
    pub target_price: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let target_price = Decimal::from_str(&row.target_price).map_err(|e| {
            RepositoryError::InvalidData(format!(
                "target_price {:?} for {}: {}",
                row.target_price, row.url, e
            ))
        })?;

        Ok(Self {
            url: row.url,
            name: row.name,
            target_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_reached_boundary() {
        let product = Product::new("http://x/p1", "Widget", Decimal::new(5000, 2));
        assert!(product.is_target_reached(Decimal::new(4800, 2)));
        assert!(product.is_target_reached(Decimal::new(50, 0)));
        assert!(!product.is_target_reached(Decimal::new(5001, 2)));
    }

    #[test]
    fn test_row_with_bad_price_is_rejected() {
        let row = ProductRow {
            url: "http://x/p1".to_string(),
            name: "Widget".to_string(),
            target_price: "fifty".to_string(),
        };
        assert!(matches!(
            Product::try_from(row),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
