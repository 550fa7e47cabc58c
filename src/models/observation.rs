use crate::error::RepositoryError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// One timestamped price reading for a tracked product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub url: String,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// `price_history` row; `timestamp` is Unix microseconds
#[derive(Debug, Clone, FromRow)]
pub struct ObservationRow {
    pub url: String,
    pub price: String,
    pub timestamp: i64,
}

impl TryFrom<ObservationRow> for Observation {
    type Error = RepositoryError;

    fn try_from(row: ObservationRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price).map_err(|e| {
            RepositoryError::InvalidData(format!("price {:?} for {}: {}", row.price, row.url, e))
        })?;

        let observed_at = DateTime::<Utc>::from_timestamp_micros(row.timestamp).ok_or_else(|| {
            RepositoryError::InvalidData(format!(
                "timestamp {} for {} is out of range",
                row.timestamp, row.url
            ))
        })?;

        Ok(Self {
            url: row.url,
            price,
            observed_at,
        })
    }
}
