pub mod price_history_repository;
pub mod product_repository;

// Re-export all repositories for convenient access
pub use price_history_repository::PriceHistoryRepository;
pub use product_repository::ProductRepository;
