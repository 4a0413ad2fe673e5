//! Reporting commands.

use sqlx::SqlitePool;

use storehouse_core::CollectionId;
use storehouse_store::models::{OrderDetail, Product};
use storehouse_store::{PriceSummary, ReportRepository, RepositoryError};

/// Unit price aggregates, optionally for one collection.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
pub async fn prices(
    pool: &SqlitePool,
    collection: Option<i32>,
) -> Result<PriceSummary, RepositoryError> {
    ReportRepository::new(pool)
        .price_summary(collection.map(CollectionId::new))
        .await
}

/// The latest orders.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
pub async fn recent(pool: &SqlitePool, limit: u32) -> Result<Vec<OrderDetail>, RepositoryError> {
    ReportRepository::new(pool).recent_orders(limit).await
}

/// Products that appear on an order.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
pub async fn ordered(pool: &SqlitePool) -> Result<Vec<Product>, RepositoryError> {
    ReportRepository::new(pool).ordered_products().await
}
