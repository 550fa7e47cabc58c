mod helpers;

use chrono::{Duration, TimeZone, Utc};
use helpers::*;
use price_tracker::error::RepositoryError;
use price_tracker::store::PriceStore;
use sqlx::Row;

// ============================================================================
// Schema
// ============================================================================

#[tokio::test]
async fn test_migrations_create_tables() {
    let db = TestDatabase::new().await;

    for table in ["products", "price_history"] {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&db.pool)
            .await
            .expect("Failed to query schema");
        let count: i64 = row.get("n");
        assert_eq!(count, 1, "Table {} should exist", table);
    }
}

#[tokio::test]
async fn test_foreign_keys_enforced_by_engine() {
    let db = TestDatabase::new().await;

    let result = sqlx::query("INSERT INTO price_history (url, price, timestamp) VALUES (?, ?, ?)")
        .bind("http://x/orphan")
        .bind("10.00")
        .bind(0_i64)
        .execute(&db.pool)
        .await;

    let err = RepositoryError::from(result.expect_err("orphan row must be rejected"));
    assert!(matches!(err, RepositoryError::Integrity(_)), "got {:?}", err);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_upsert_product_is_idempotent() {
    let db = TestDatabase::new().await;

    let first = db
        .store
        .upsert_product("http://x/p1", "Widget", dec("50.00"))
        .await
        .expect("Failed to upsert");
    let second = db
        .store
        .upsert_product("http://x/p1", "Widget", dec("50.00"))
        .await
        .expect("Failed to upsert again");

    assert_eq!(first, second);
    let products = db.store.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0], first);
}

#[tokio::test]
async fn test_upsert_replaces_and_keeps_history() {
    let db = TestDatabase::new().await;
    let url = "http://x/p1";

    db.store.upsert_product(url, "Widget", dec("50.00")).await.unwrap();
    db.store
        .append_observation(url, dec("55.00"), Utc::now())
        .await
        .unwrap();

    let replaced = db
        .store
        .upsert_product(url, "Widget v2", dec("40.00"))
        .await
        .unwrap();
    assert_eq!(replaced.name, "Widget v2");
    assert_eq!(replaced.target_price, dec("40.00"));

    let found = db.store.find_product(url).await.unwrap().expect("product exists");
    assert_eq!(found, replaced);
    assert_eq!(db.store.list_observations(url).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_upsert_rejects_negative_target() {
    let db = TestDatabase::new().await;

    let result = db.store.upsert_product("http://x/p1", "Widget", dec("-1")).await;
    assert!(matches!(result, Err(RepositoryError::InvalidInput(_))));
    assert!(db.store.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_products_in_insertion_order() {
    let db = TestDatabase::new().await;

    for url in ["http://x/c", "http://x/a", "http://x/b"] {
        db.store.upsert_product(url, url, dec("1")).await.unwrap();
    }
    // Re-adding does not move a product
    db.store.upsert_product("http://x/c", "renamed", dec("2")).await.unwrap();

    let urls: Vec<String> = db
        .store
        .list_products()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.url)
        .collect();
    assert_eq!(urls, vec!["http://x/c", "http://x/a", "http://x/b"]);
}

#[tokio::test]
async fn test_find_unknown_product() {
    let db = TestDatabase::new().await;
    assert!(db.store.find_product("http://x/none").await.unwrap().is_none());
}

// ============================================================================
// Observations
// ============================================================================

#[tokio::test]
async fn test_append_without_product_is_integrity_error() {
    let db = TestDatabase::new().await;

    let result = db
        .store
        .append_observation("http://x/untracked", dec("10"), Utc::now())
        .await;

    assert!(matches!(result, Err(RepositoryError::Integrity(_))));
    assert!(db
        .store
        .list_observations("http://x/untracked")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_append_rejects_negative_price() {
    let db = TestDatabase::new().await;
    db.store.upsert_product("http://x/p1", "Widget", dec("5")).await.unwrap();

    let result = db
        .store
        .append_observation("http://x/p1", dec("-0.01"), Utc::now())
        .await;
    assert!(matches!(result, Err(RepositoryError::InvalidInput(_))));
}

#[tokio::test]
async fn test_list_observations_empty_for_unknown_url() {
    let db = TestDatabase::new().await;
    let history = db.store.list_observations("http://x/none").await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_observations_ascending_by_time() {
    let db = TestDatabase::new().await;
    let url = "http://x/p1";
    db.store.upsert_product(url, "Widget", dec("50")).await.unwrap();

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    for (i, price) in ["55.00", "54.00", "49.99"].iter().enumerate() {
        db.store
            .append_observation(url, dec(price), start + Duration::minutes(i as i64))
            .await
            .unwrap();
    }

    let history = db.store.list_observations(url).await.unwrap();
    let prices: Vec<_> = history.iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![dec("55.00"), dec("54.00"), dec("49.99")]);
    assert_eq!(history[0].observed_at, start);
    assert!(history.windows(2).all(|w| w[0].observed_at <= w[1].observed_at));
}

#[tokio::test]
async fn test_late_timestamp_does_not_reorder_series() {
    let db = TestDatabase::new().await;
    let url = "http://x/p1";
    db.store.upsert_product(url, "Widget", dec("50")).await.unwrap();

    let later = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let earlier = later - Duration::seconds(30);

    db.store.append_observation(url, dec("52"), later).await.unwrap();
    let stored = db.store.append_observation(url, dec("51"), earlier).await.unwrap();

    // Accepted second, so it may not sort before the first
    assert_eq!(stored.observed_at, later);

    let history = db.store.list_observations(url).await.unwrap();
    let prices: Vec<_> = history.iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![dec("52"), dec("51")]);
}

#[tokio::test]
async fn test_series_are_independent_per_url() {
    let db = TestDatabase::new().await;
    let late = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let early = late - Duration::hours(1);

    db.store.upsert_product("http://x/a", "A", dec("1")).await.unwrap();
    db.store.upsert_product("http://x/b", "B", dec("1")).await.unwrap();
    db.store.append_observation("http://x/a", dec("3"), late).await.unwrap();
    let b = db.store.append_observation("http://x/b", dec("4"), early).await.unwrap();

    assert_eq!(b.observed_at, early);
}

#[tokio::test]
async fn test_track_product_writes_both_rows() {
    let db = TestDatabase::new().await;
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

    let (product, observation) = db
        .store
        .track_product("http://x/p1", "Widget", dec("50.00"), dec("55.00"), now)
        .await
        .expect("Failed to track product");

    assert_eq!(product.name, "Widget");
    assert_eq!(observation.price, dec("55.00"));
    assert_eq!(observation.observed_at, now);

    let history = db.store.list_observations("http://x/p1").await.unwrap();
    assert_eq!(history, vec![observation]);
}

#[tokio::test]
async fn test_track_product_rolls_back_on_invalid_price() {
    let db = TestDatabase::new().await;

    let result = db
        .store
        .track_product("http://x/p1", "Widget", dec("50"), dec("-3"), Utc::now())
        .await;

    assert!(matches!(result, Err(RepositoryError::InvalidInput(_))));
    assert!(db.store.find_product("http://x/p1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_appends_keep_every_row() {
    let db = TestDatabase::new().await;
    let url = "http://x/p1";
    db.store.upsert_product(url, "Widget", dec("50")).await.unwrap();

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let store = db.store.clone();
            tokio::spawn(async move {
                store
                    .append_observation(url, rust_decimal::Decimal::from(i), Utc::now())
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().expect("append failed");
    }

    let history = db.store.list_observations(url).await.unwrap();
    assert_eq!(history.len(), 10);
    assert!(history.windows(2).all(|w| w[0].observed_at <= w[1].observed_at));
}

#[tokio::test]
async fn test_writes_survive_reopen() {
    let db = TestDatabase::new().await;
    db.store
        .track_product("http://x/p1", "Widget", dec("50"), dec("55"), Utc::now())
        .await
        .unwrap();
    db.pool.close().await;

    let reopened = PriceStore::new(db.reopen().await);
    let products = reopened.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Widget");
    assert_eq!(reopened.list_observations("http://x/p1").await.unwrap().len(), 1);
}
