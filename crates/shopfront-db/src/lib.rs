use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{MySql, MySqlPool};
use thiserror::Error;
use tokio::sync::Mutex;

use shopfront_core::{AppConfig, DatabaseConfig};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/shopfront-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_connections: read_u32("SHOPFRONT_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            min_connections: read_u32("SHOPFRONT_DB_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS),
            acquire_timeout_secs: read_u64(
                "SHOPFRONT_DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            ),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("product {id} was inserted but could not be reloaded")]
    InsertReloadFailed { id: i64 },
    #[error("malformed JSON in products.{column}")]
    MalformedColumn {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a MySQL pool using explicit connection and pool settings.
///
/// Parameters are passed through typed [`MySqlConnectOptions`], never an
/// interpolated URL string.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(
    config: &DatabaseConfig,
    pool_config: PoolConfig,
) -> Result<MySqlPool, sqlx::Error> {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database);

    MySqlPoolOptions::new()
        .max_connections(pool_config.max_connections)
        .min_connections(pool_config.min_connections)
        .acquire_timeout(Duration::from_secs(pool_config.acquire_timeout_secs))
        .connect_with(options)
        .await
}

/// A bind value for ad-hoc statements run through [`Database::execute`] and
/// [`Database::fetch_all`]. Keeps even operator-supplied statements on bound
/// parameters.
#[derive(Debug, Clone)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Bool(bool),
    Decimal(Decimal),
    Json(serde_json::Value),
    Null,
}

/// Metadata returned by a mutating statement.
#[derive(Debug, Clone, Copy)]
pub struct ExecResult {
    pub last_insert_id: u64,
    pub rows_affected: u64,
}

fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    params: &'q [SqlParam],
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.as_str()),
            SqlParam::Bool(v) => query.bind(*v),
            SqlParam::Decimal(v) => query.bind(*v),
            SqlParam::Json(v) => query.bind(v),
            SqlParam::Null => query.bind(Option::<String>::None),
        };
    }
    query
}

/// The process-wide connection manager.
///
/// Constructed once by the host and passed to repository functions. The pool
/// itself is created lazily on first [`acquire`](Database::acquire) and
/// shared by every caller until [`release`](Database::release).
pub struct Database {
    config: DatabaseConfig,
    pool_config: PoolConfig,
    pool: Mutex<Option<MySqlPool>>,
}

impl Database {
    #[must_use]
    pub fn new(config: DatabaseConfig, pool_config: PoolConfig) -> Self {
        Self {
            config,
            pool_config,
            pool: Mutex::new(None),
        }
    }

    /// Wrap an externally built pool.
    ///
    /// Used by test harnesses and hosts that manage their own pool; the
    /// wrapped pool is already "acquired" and lazy connection never runs
    /// unless [`release`](Database::release) is called first.
    #[must_use]
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self {
            config: DatabaseConfig::default(),
            pool_config: PoolConfig::default(),
            pool: Mutex::new(Some(pool)),
        }
    }

    /// Returns the shared pool, creating it on first call.
    ///
    /// Creation checks out and releases one connection before the pool is
    /// published, so a bad host or credentials fail here rather than on the
    /// first query. The mutex is held across creation: concurrent first
    /// calls wait, and at most one pool ever exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the pool cannot be created or the probe
    /// connection cannot be checked out. Connection failures are not retried.
    pub async fn acquire(&self) -> Result<MySqlPool, DbError> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let pool = connect_pool(&self.config, self.pool_config).await?;
        if let Err(e) = pool.acquire().await {
            pool.close().await;
            return Err(e.into());
        }
        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            database = %self.config.database,
            "connected to MySQL"
        );

        *guard = Some(pool.clone());
        Ok(pool)
    }

    /// Closes all pooled connections and resets to the uninitialized state.
    ///
    /// A later [`acquire`](Database::acquire) reconnects. Idempotent: calling
    /// this when no pool exists is a no-op.
    pub async fn release(&self) {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.take() {
            pool.close().await;
            tracing::info!("disconnected from MySQL");
        }
    }

    /// Runs a parameterized mutating statement and returns its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the statement fails.
    pub async fn execute(
        &self,
        statement: &str,
        params: &[SqlParam],
    ) -> Result<ExecResult, DbError> {
        let pool = self.acquire().await?;
        let result = bind_params(sqlx::query(statement), params)
            .execute(&pool)
            .await?;
        Ok(ExecResult {
            last_insert_id: result.last_insert_id(),
            rows_affected: result.rows_affected(),
        })
    }

    /// Runs a parameterized query and returns the raw result rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn fetch_all(
        &self,
        statement: &str,
        params: &[SqlParam],
    ) -> Result<Vec<MySqlRow>, DbError> {
        let pool = self.acquire().await?;
        let rows = bind_params(sqlx::query(statement), params)
            .fetch_all(&pool)
            .await?;
        Ok(rows)
    }
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &MySqlPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // Count applied migrations before running. The _sqlx_migrations table may not
    // exist yet on a fresh database; treat absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &MySqlPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

fn read_u32(var: &str, default: u32) -> u32 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn read_u64(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }
}

pub mod products;
pub mod seed;

pub use products::{
    create_product, delete_all_products, delete_product, get_product_by_id, get_product_by_slug,
    insert_products, list_products, list_products_in_category, list_published_products,
    search_products, update_product, ProductRow,
};
pub use seed::reset_and_seed;
