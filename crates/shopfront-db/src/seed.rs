//! Reset-and-seed workflow used by the operator CLI.

use shopfront_core::{Product, ProductInput};
use tracing::info;

use crate::{products, Database, DbError};

/// Delete every product row, then insert the given catalog sequentially.
///
/// Returns the created records in catalog order. The two phases are not
/// wrapped in one transaction: a failure partway through leaves earlier
/// inserts committed, and the seed flow simply reruns from scratch.
///
/// # Errors
///
/// Returns [`DbError`] if the delete or any insert fails.
pub async fn reset_and_seed(
    db: &Database,
    catalog: &[ProductInput],
) -> Result<Vec<Product>, DbError> {
    let removed = products::delete_all_products(db).await?;
    info!(removed, "cleared products table");

    let created = products::insert_products(db, catalog).await?;
    info!(created = created.len(), "seeded products table");

    Ok(created)
}
