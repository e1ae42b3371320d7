//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::{MySql, QueryBuilder};

use shopfront_core::{Product, ProductInput, ProductPatch};

use crate::{Database, DbError};

// ---------------------------------------------------------------------------
// Row type and mapping
// ---------------------------------------------------------------------------

/// A row from the `products` table.
///
/// JSON columns land as raw [`serde_json::Value`]s; shaping them into typed
/// sequences happens in the [`TryFrom`] conversion so a malformed column is
/// reported by name instead of as an opaque decode failure.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub images: Option<JsonValue>,
    pub brand: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub list_price: Decimal,
    pub count_in_stock: i32,
    pub tags: Option<JsonValue>,
    pub colors: Option<JsonValue>,
    pub sizes: Option<JsonValue>,
    pub avg_rating: Decimal,
    pub num_reviews: i32,
    pub rating_distribution: Option<JsonValue>,
    pub num_sales: i32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Decode a JSON column into its typed sequence form.
///
/// SQL `NULL` and JSON `null` decode to an empty sequence. Any other shape
/// mismatch is a data-integrity error and propagates.
fn decode_seq<T: DeserializeOwned>(
    value: Option<JsonValue>,
    column: &'static str,
) -> Result<Vec<T>, DbError> {
    match value {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value).map_err(|source| DbError::MalformedColumn {
                column,
                source,
            })
        }
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            category: row.category,
            images: decode_seq(row.images, "images")?,
            brand: row.brand,
            description: row.description.unwrap_or_default(),
            price: row.price,
            list_price: row.list_price,
            count_in_stock: row.count_in_stock,
            tags: decode_seq(row.tags, "tags")?,
            colors: decode_seq(row.colors, "colors")?,
            sizes: decode_seq(row.sizes, "sizes")?,
            avg_rating: row.avg_rating,
            num_reviews: row.num_reviews,
            rating_distribution: decode_seq(row.rating_distribution, "rating_distribution")?,
            num_sales: row.num_sales,
            is_published: row.is_published,
            // Reviews are populated by a separate subsystem.
            reviews: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn rows_to_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, DbError> {
    rows.into_iter().map(Product::try_from).collect()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all products, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::MalformedColumn`] if a JSON column cannot be decoded.
pub async fn list_products(db: &Database) -> Result<Vec<Product>, DbError> {
    let pool = db.acquire().await?;
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, slug, category, images, brand, description, price, list_price, \
                count_in_stock, tags, colors, sizes, avg_rating, num_reviews, \
                rating_distribution, num_sales, is_published, created_at, updated_at \
         FROM products \
         ORDER BY created_at DESC",
    )
    .fetch_all(&pool)
    .await?;

    rows_to_products(rows)
}

/// Returns a single product by id, or `None` if no row matches.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::MalformedColumn`] if a JSON column cannot be decoded.
pub async fn get_product_by_id(db: &Database, id: i64) -> Result<Option<Product>, DbError> {
    let pool = db.acquire().await?;
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, slug, category, images, brand, description, price, list_price, \
                count_in_stock, tags, colors, sizes, avg_rating, num_reviews, \
                rating_distribution, num_sales, is_published, created_at, updated_at \
         FROM products \
         WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    row.map(Product::try_from).transpose()
}

/// Returns a single product by slug, or `None` if no row matches.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::MalformedColumn`] if a JSON column cannot be decoded.
pub async fn get_product_by_slug(db: &Database, slug: &str) -> Result<Option<Product>, DbError> {
    let pool = db.acquire().await?;
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, slug, category, images, brand, description, price, list_price, \
                count_in_stock, tags, colors, sizes, avg_rating, num_reviews, \
                rating_distribution, num_sales, is_published, created_at, updated_at \
         FROM products \
         WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(&pool)
    .await?;

    row.map(Product::try_from).transpose()
}

/// Returns published products in a category, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::MalformedColumn`] if a JSON column cannot be decoded.
pub async fn list_products_in_category(
    db: &Database,
    category: &str,
) -> Result<Vec<Product>, DbError> {
    let pool = db.acquire().await?;
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, slug, category, images, brand, description, price, list_price, \
                count_in_stock, tags, colors, sizes, avg_rating, num_reviews, \
                rating_distribution, num_sales, is_published, created_at, updated_at \
         FROM products \
         WHERE category = ? AND is_published = TRUE \
         ORDER BY created_at DESC",
    )
    .bind(category)
    .fetch_all(&pool)
    .await?;

    rows_to_products(rows)
}

/// Returns all published products, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::MalformedColumn`] if a JSON column cannot be decoded.
pub async fn list_published_products(db: &Database) -> Result<Vec<Product>, DbError> {
    let pool = db.acquire().await?;
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, slug, category, images, brand, description, price, list_price, \
                count_in_stock, tags, colors, sizes, avg_rating, num_reviews, \
                rating_distribution, num_sales, is_published, created_at, updated_at \
         FROM products \
         WHERE is_published = TRUE \
         ORDER BY created_at DESC",
    )
    .fetch_all(&pool)
    .await?;

    rows_to_products(rows)
}

/// Returns published products whose name, description, or brand contains the
/// term as a substring, newest first.
///
/// Matching is case-insensitive via the table's utf8mb4_unicode_ci collation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::MalformedColumn`] if a JSON column cannot be decoded.
pub async fn search_products(db: &Database, term: &str) -> Result<Vec<Product>, DbError> {
    let pool = db.acquire().await?;
    let pattern = format!("%{term}%");
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, slug, category, images, brand, description, price, list_price, \
                count_in_stock, tags, colors, sizes, avg_rating, num_reviews, \
                rating_distribution, num_sales, is_published, created_at, updated_at \
         FROM products \
         WHERE (name LIKE ? OR description LIKE ? OR brand LIKE ?) \
           AND is_published = TRUE \
         ORDER BY created_at DESC",
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(&pool)
    .await?;

    rows_to_products(rows)
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Inserts a new product and returns the fully reloaded record.
///
/// A duplicate slug surfaces as the store's uniqueness violation inside
/// [`DbError::Sqlx`]; it is not translated here.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, or
/// [`DbError::InsertReloadFailed`] if the insert succeeds but the new row
/// cannot be read back — an internal inconsistency, distinct from an
/// ordinary miss.
pub async fn create_product(db: &Database, input: &ProductInput) -> Result<Product, DbError> {
    let pool = db.acquire().await?;
    let result = sqlx::query(
        "INSERT INTO products \
             (name, slug, category, images, brand, description, price, list_price, \
              count_in_stock, tags, colors, sizes, avg_rating, num_reviews, \
              rating_distribution, num_sales, is_published) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.name)
    .bind(&input.slug)
    .bind(&input.category)
    .bind(Json(&input.images))
    .bind(&input.brand)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.list_price)
    .bind(input.count_in_stock)
    .bind(Json(&input.tags))
    .bind(Json(&input.colors))
    .bind(Json(&input.sizes))
    .bind(input.avg_rating)
    .bind(input.num_reviews)
    .bind(Json(&input.rating_distribution))
    .bind(input.num_sales)
    .bind(input.is_published)
    .execute(&pool)
    .await?;

    #[allow(clippy::cast_possible_wrap)] // AUTO_INCREMENT ids fit in BIGINT
    let id = result.last_insert_id() as i64;

    match get_product_by_id(db, id).await? {
        Some(product) => Ok(product),
        None => Err(DbError::InsertReloadFailed { id }),
    }
}

/// Applies a partial update and returns the reloaded record, or `None` if
/// the id does not exist.
///
/// Only the fields present in the patch are written; an empty patch issues
/// no statement at all. `updated_at` refreshes through the column's
/// `ON UPDATE CURRENT_TIMESTAMP` clause, so a no-op patch leaves it alone.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update or reload fails, or
/// [`DbError::MalformedColumn`] if a JSON column cannot be decoded on reload.
pub async fn update_product(
    db: &Database,
    id: i64,
    patch: &ProductPatch,
) -> Result<Option<Product>, DbError> {
    if let Some(mut query) = build_update(id, patch) {
        let pool = db.acquire().await?;
        query.build().execute(&pool).await?;
    }

    get_product_by_id(db, id).await
}

/// Builds the dynamic UPDATE for a patch, or `None` when the patch is empty.
///
/// Inclusion is driven by field presence: `Some("")`, `Some(0)`, and
/// `Some(false)` all produce an assignment. JSON-bearing fields are bound
/// through [`Json`] so they re-serialize on write.
fn build_update<'a>(id: i64, patch: &'a ProductPatch) -> Option<QueryBuilder<'a, MySql>> {
    if patch.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::new("UPDATE products SET ");
    let mut fields = builder.separated(", ");

    if let Some(name) = &patch.name {
        fields.push("name = ").push_bind_unseparated(name.as_str());
    }
    if let Some(slug) = &patch.slug {
        fields.push("slug = ").push_bind_unseparated(slug.as_str());
    }
    if let Some(category) = &patch.category {
        fields
            .push("category = ")
            .push_bind_unseparated(category.as_str());
    }
    if let Some(images) = &patch.images {
        fields.push("images = ").push_bind_unseparated(Json(images));
    }
    if let Some(brand) = &patch.brand {
        fields
            .push("brand = ")
            .push_bind_unseparated(brand.as_str());
    }
    if let Some(description) = &patch.description {
        fields
            .push("description = ")
            .push_bind_unseparated(description.as_str());
    }
    if let Some(price) = patch.price {
        fields.push("price = ").push_bind_unseparated(price);
    }
    if let Some(list_price) = patch.list_price {
        fields
            .push("list_price = ")
            .push_bind_unseparated(list_price);
    }
    if let Some(count_in_stock) = patch.count_in_stock {
        fields
            .push("count_in_stock = ")
            .push_bind_unseparated(count_in_stock);
    }
    if let Some(tags) = &patch.tags {
        fields.push("tags = ").push_bind_unseparated(Json(tags));
    }
    if let Some(colors) = &patch.colors {
        fields.push("colors = ").push_bind_unseparated(Json(colors));
    }
    if let Some(sizes) = &patch.sizes {
        fields.push("sizes = ").push_bind_unseparated(Json(sizes));
    }
    if let Some(avg_rating) = patch.avg_rating {
        fields
            .push("avg_rating = ")
            .push_bind_unseparated(avg_rating);
    }
    if let Some(num_reviews) = patch.num_reviews {
        fields
            .push("num_reviews = ")
            .push_bind_unseparated(num_reviews);
    }
    if let Some(rating_distribution) = &patch.rating_distribution {
        fields
            .push("rating_distribution = ")
            .push_bind_unseparated(Json(rating_distribution));
    }
    if let Some(num_sales) = patch.num_sales {
        fields
            .push("num_sales = ")
            .push_bind_unseparated(num_sales);
    }
    if let Some(is_published) = patch.is_published {
        fields
            .push("is_published = ")
            .push_bind_unseparated(is_published);
    }

    builder.push(" WHERE id = ").push_bind(id);
    Some(builder)
}

/// Deletes a product by id.
///
/// Returns `true` if a row was removed, `false` if the id did not exist —
/// a boolean outcome, not an error. Reviews referencing the product are
/// removed by the store's cascade.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn delete_product(db: &Database, id: i64) -> Result<bool, DbError> {
    let pool = db.acquire().await?;
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes all product rows and returns the count removed.
///
/// Used only by reset/seed flows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn delete_all_products(db: &Database) -> Result<u64, DbError> {
    let pool = db.acquire().await?;
    let result = sqlx::query("DELETE FROM products").execute(&pool).await?;
    Ok(result.rows_affected())
}

/// Creates each input sequentially via [`create_product`], in input order,
/// and returns the created records in that same order.
///
/// Not wrapped in a transaction: a failure partway through leaves prior
/// creations committed. Callers needing all-or-nothing bulk insert must
/// provide their own transaction boundary.
///
/// # Errors
///
/// Returns the first [`DbError`] encountered; earlier inserts remain.
pub async fn insert_products(
    db: &Database,
    inputs: &[ProductInput],
) -> Result<Vec<Product>, DbError> {
    let mut created = Vec::with_capacity(inputs.len());
    for input in inputs {
        created.push(create_product(db, input).await?);
    }
    Ok(created)
}
