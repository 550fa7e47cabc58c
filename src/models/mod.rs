//! Domain models for the price tracker.

pub mod observation;
pub mod product;

pub use observation::{Observation, ObservationRow};
pub use product::{Product, ProductRow};

use serde::{Deserialize, Serialize};

/// Result of adding a product: the stored product and its first reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProduct {
    pub product: Product,
    pub observation: Observation,
}

/// Result of refreshing a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCheck {
    pub product: Product,
    pub observation: Observation,
    pub target_reached: bool,
}
