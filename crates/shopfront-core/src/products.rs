use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One bucket of a product's per-star rating histogram, e.g.
/// `{ "rating": 5, "count": 12 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBucket {
    pub rating: i32,
    pub count: i32,
}

/// A customer review of a product.
///
/// Reviews belong to exactly one product and are removed by the database
/// when the product is deleted. The persistence layer defines the type but
/// does not populate it; [`Product::reviews`] is always empty on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: Option<i64>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fully materialized product record.
///
/// Serializes with camelCase field names, matching the JSON contract the
/// HTTP layer exposes to storefront clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// URL-safe identifier, unique across all products.
    pub slug: String,
    pub category: String,
    /// Ordered image URLs; the first entry is the listing image.
    pub images: Vec<String>,
    pub brand: String,
    pub description: String,
    /// Current sale price.
    pub price: Decimal,
    /// Pre-discount price shown struck through on the storefront.
    pub list_price: Decimal,
    pub count_in_stock: i32,
    pub tags: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    /// Average review rating, 0 to 5.
    pub avg_rating: Decimal,
    pub num_reviews: i32,
    pub rating_distribution: Vec<RatingBucket>,
    pub num_sales: i32,
    pub is_published: bool,
    /// Always empty when loaded by this layer; reviews are populated by a
    /// separate subsystem.
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns `true` if the current price undercuts the list price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.price < self.list_price
    }

    /// Returns `true` if at least one unit is available.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.count_in_stock > 0
    }
}

/// Payload for creating a product.
///
/// `name`, `slug`, `category`, `images`, `brand`, `price`, `list_price`,
/// and `count_in_stock` are required; everything else defaults, so catalog
/// files and API callers may omit the optional fields entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub images: Vec<String>,
    pub brand: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub list_price: Decimal,
    pub count_in_stock: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub avg_rating: Decimal,
    #[serde(default)]
    pub num_reviews: i32,
    #[serde(default)]
    pub rating_distribution: Vec<RatingBucket>,
    #[serde(default)]
    pub num_sales: i32,
    #[serde(default)]
    pub is_published: bool,
}

/// Sparse payload for partial updates.
///
/// Field presence, not value truthiness, decides what gets written: `None`
/// leaves the stored column untouched, while `Some(v)` writes `v` even when
/// it is an empty string, zero, or `false`. A patch with every field `None`
/// is a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_in_stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_reviews: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_distribution: Option<Vec<RatingBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_sales: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

impl ProductPatch {
    /// Returns `true` when no field is present, i.e. applying the patch
    /// would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.category.is_none()
            && self.images.is_none()
            && self.brand.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.list_price.is_none()
            && self.count_in_stock.is_none()
            && self.tags.is_none()
            && self.colors.is_none()
            && self.sizes.is_none()
            && self.avg_rating.is_none()
            && self.num_reviews.is_none()
            && self.rating_distribution.is_none()
            && self.num_sales.is_none()
            && self.is_published.is_none()
    }
}

/// The operator-authored seed catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<ProductInput>,
}

/// Load and validate the seed catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_product_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for product in &catalog.products {
        if product.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "product name must be non-empty".to_string(),
            ));
        }

        if product.slug.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "product '{}' has an empty slug",
                product.name
            )));
        }

        if product.images.is_empty() {
            return Err(ConfigError::Validation(format!(
                "product '{}' has no images",
                product.slug
            )));
        }

        // Duplicate slugs would also trip the unique index at insert time,
        // but the catalog is hand-edited and the early error names the slug.
        if !seen_slugs.insert(product.slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate product slug: '{}'",
                product.slug
            )));
        }
    }

    Ok(())
}
