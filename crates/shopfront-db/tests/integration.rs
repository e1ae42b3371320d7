//! Offline unit tests for shopfront-db pool configuration and row mapping.
//! These tests do not require a live database connection.

use std::path::PathBuf;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use shopfront_core::{AppConfig, DatabaseConfig, Product};
use shopfront_db::{DbError, PoolConfig, ProductRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database: DatabaseConfig {
            host: "db.internal".to_string(),
            port: 3307,
            user: "shop".to_string(),
            password: "secret".to_string(),
            database: "shopfront".to_string(),
        },
        log_level: "info".to_string(),
        seed_path: PathBuf::from("./config/products.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// A well-formed row with every JSON column populated.
fn make_row() -> ProductRow {
    ProductRow {
        id: 42,
        name: "Classic Oxford Shirt".to_string(),
        slug: "classic-oxford-shirt".to_string(),
        category: "men".to_string(),
        images: Some(json!(["/images/oxford-1.jpg", "/images/oxford-2.jpg"])),
        brand: "Acme".to_string(),
        description: Some("A classic oxford shirt.".to_string()),
        price: Decimal::new(1999, 2),
        list_price: Decimal::new(2499, 2),
        count_in_stock: 5,
        tags: Some(json!(["new-arrival", "best-seller"])),
        colors: Some(json!(["White", "Blue"])),
        sizes: Some(json!(["M", "L", "XL"])),
        avg_rating: Decimal::new(450, 2),
        num_reviews: 12,
        rating_distribution: Some(json!([
            { "rating": 5, "count": 8 },
            { "rating": 4, "count": 4 },
        ])),
        num_sales: 31,
        is_published: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn row_maps_json_columns_to_typed_sequences() {
    let product = Product::try_from(make_row()).expect("mapping failed");

    assert_eq!(
        product.images,
        vec!["/images/oxford-1.jpg", "/images/oxford-2.jpg"]
    );
    assert_eq!(product.tags, vec!["new-arrival", "best-seller"]);
    assert_eq!(product.colors, vec!["White", "Blue"]);
    assert_eq!(product.sizes, vec!["M", "L", "XL"]);
    assert_eq!(product.rating_distribution.len(), 2);
    assert_eq!(product.rating_distribution[0].rating, 5);
    assert_eq!(product.rating_distribution[0].count, 8);
}

#[test]
fn row_maps_scalars_and_flags() {
    let product = Product::try_from(make_row()).expect("mapping failed");

    assert_eq!(product.id, 42);
    assert_eq!(product.slug, "classic-oxford-shirt");
    assert_eq!(product.price, Decimal::new(1999, 2));
    assert_eq!(product.avg_rating, Decimal::new(450, 2));
    assert_eq!(product.count_in_stock, 5);
    assert!(product.is_published);
}

#[test]
fn row_mapping_leaves_reviews_empty() {
    let product = Product::try_from(make_row()).expect("mapping failed");
    assert!(product.reviews.is_empty());
}

#[test]
fn null_json_columns_map_to_empty_sequences() {
    let mut row = make_row();
    row.tags = None;
    row.colors = Some(serde_json::Value::Null);
    row.sizes = None;
    row.rating_distribution = None;

    let product = Product::try_from(row).expect("mapping failed");
    assert!(product.tags.is_empty());
    assert!(product.colors.is_empty());
    assert!(product.sizes.is_empty());
    assert!(product.rating_distribution.is_empty());
}

#[test]
fn null_description_maps_to_empty_string() {
    let mut row = make_row();
    row.description = None;

    let product = Product::try_from(row).expect("mapping failed");
    assert_eq!(product.description, "");
}

#[test]
fn malformed_json_column_is_a_data_integrity_error() {
    let mut row = make_row();
    row.images = Some(json!({ "not": "an array" }));

    let result = Product::try_from(row);
    assert!(
        matches!(
            result,
            Err(DbError::MalformedColumn {
                column: "images",
                ..
            })
        ),
        "expected MalformedColumn(images), got: {result:?}"
    );
}

#[test]
fn malformed_rating_distribution_is_reported_by_name() {
    let mut row = make_row();
    row.rating_distribution = Some(json!(["five stars"]));

    let result = Product::try_from(row);
    assert!(
        matches!(
            result,
            Err(DbError::MalformedColumn {
                column: "rating_distribution",
                ..
            })
        ),
        "expected MalformedColumn(rating_distribution), got: {result:?}"
    );
}
