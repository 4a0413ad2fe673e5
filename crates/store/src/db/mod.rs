//! Database operations for the store schema.
//!
//! # Database: `SQLite`
//!
//! ## Tables
//!
//! - `store_collection` - Product collections (featured product is `SET NULL`)
//! - `store_product` - Catalog (collection is `RESTRICT`)
//! - `store_promotion`, `store_product_promotions` - Promotions (many-to-many)
//! - `store_customer` - Customers (unique email)
//! - `store_order`, `store_orderitem` - Orders (customer and product are `RESTRICT`)
//! - `store_address` - Addresses (customer is `CASCADE`)
//! - `store_cart`, `store_cartitem` - Carts (cart is `CASCADE`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p storehouse-cli -- migrate
//! ```
//! The tags migrations are applied first, into the same `_sqlx_migrations`
//! table.

pub mod addresses;
pub mod carts;
pub mod collections;
pub mod customers;
pub mod orders;
pub mod products;
pub mod promotions;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use storehouse_tags::TagError;

use crate::config::StoreConfig;
use crate::models::ValidationError;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use collections::CollectionRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use promotions::PromotionRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Error from the tags module.
    #[error(transparent)]
    Tags(#[from] TagError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Delete blocked because other rows still reference the target.
    #[error("cannot delete: {0}")]
    Protected(String),

    /// Input rejected by validation or a check constraint.
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<ValidationError> for RepositoryError {
    fn from(e: ValidationError) -> Self {
        Self::Invalid(e.to_string())
    }
}

/// Create a `SQLite` connection pool from the store configuration.
///
/// Foreign keys are enforced on every connection. An in-memory database is
/// held on a single connection that is never recycled, since closing it would
/// drop the schema.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is malformed or the connection cannot be
/// established.
pub async fn create_pool(config: &StoreConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(config.database_url.expose_secret())?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
    let pool_options = if config.is_in_memory() {
        pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(config.max_connections)
    };

    pool_options.connect_with(options).await
}

/// Apply the tags and store migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails to apply.
pub async fn migrate(pool: &SqlitePool) -> Result<(), RepositoryError> {
    storehouse_tags::migrate(pool).await?;

    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await?;

    tracing::info!("store migrations applied");
    Ok(())
}

// =============================================================================
// Constraint mapping
// =============================================================================

fn is_foreign_key_violation(db_err: &dyn sqlx::error::DatabaseError) -> bool {
    db_err.is_foreign_key_violation() || db_err.message().contains("FOREIGN KEY")
}

/// Map an insert/update error to a domain error.
///
/// Unique violations become `Conflict`, dangling references and check
/// violations become `Invalid`.
pub(crate) fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(db_err.message().to_owned());
        }
        if is_foreign_key_violation(&**db_err) {
            return RepositoryError::Invalid("referenced row does not exist".to_owned());
        }
        if db_err.is_check_violation() {
            return RepositoryError::Invalid(db_err.message().to_owned());
        }
    }
    RepositoryError::Database(e)
}

/// Map a delete error to a domain error: a blocked foreign key means other
/// rows still reference the target.
pub(crate) fn map_delete_error(what: &str, e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && is_foreign_key_violation(&**db_err)
    {
        return RepositoryError::Protected(format!("{what} is still referenced by other rows"));
    }
    RepositoryError::Database(e)
}

/// Append ` (SELECT value FROM json_each(?))` binding the ids as one JSON
/// array, so a selection of any size uses a single SQL variable.
pub(crate) fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i32]) {
    qb.push(" (SELECT value FROM json_each(");
    qb.push_bind(serde_json::Value::from(ids.to_vec()).to_string());
    qb.push("))");
}

/// Delete every row of `table` whose id is listed, in one transaction.
///
/// Either all rows go or, when any of them is still referenced, none do.
pub(crate) async fn delete_many(
    pool: &SqlitePool,
    table: &'static str,
    ids: &[i32],
) -> Result<u64, RepositoryError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("DELETE FROM {table} WHERE id IN"));
    push_id_list(&mut qb, ids);
    let result = qb
        .build()
        .execute(&mut *tx)
        .await
        .map_err(|e| map_delete_error(table, e))?;

    tx.commit().await?;
    Ok(result.rows_affected())
}

/// Decode a `DECIMAL(6, 2)` column read back as text.
pub(crate) fn parse_price(
    column: &str,
    value: &str,
) -> Result<storehouse_core::Price, RepositoryError> {
    value
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {column} in database: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Fresh migrated in-memory store.
    #[allow(clippy::unwrap_used)]
    pub async fn pool() -> SqlitePool {
        let pool = create_pool(&StoreConfig::in_memory()).await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }
}
