//! Read-only reporting queries over the catalog and orders.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::instrument;

use storehouse_core::CollectionId;

use crate::db::products::{PRODUCT_COLUMNS, ProductRow};
use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::models::{OrderDetail, Product, ProductWithCollection};

/// Aggregate of product unit prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSummary {
    /// Number of products.
    pub count: i64,
    /// Lowest unit price, if any product matched.
    pub min: Option<Decimal>,
    /// Highest unit price.
    pub max: Option<Decimal>,
    /// Mean unit price, rounded to cents.
    pub average: Option<Decimal>,
    /// Sum of unit prices, rounded to cents.
    pub total: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct PriceSummaryRow {
    count: i64,
    min_price: Option<String>,
    max_price: Option<String>,
    avg_price: Option<String>,
    total_price: Option<String>,
}

fn parse_decimal(column: &str, value: Option<&str>) -> Result<Option<Decimal>, RepositoryError> {
    value
        .map(|v| {
            Decimal::from_str(v)
                .or_else(|_| Decimal::from_scientific(v))
                .map(|d| d.round_dp(2))
                .map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid {column} aggregate: {e}"))
                })
        })
        .transpose()
}

impl TryFrom<PriceSummaryRow> for PriceSummary {
    type Error = RepositoryError;

    fn try_from(row: PriceSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            count: row.count,
            min: parse_decimal("min", row.min_price.as_deref())?,
            max: parse_decimal("max", row.max_price.as_deref())?,
            average: parse_decimal("average", row.avg_price.as_deref())?,
            total: parse_decimal("total", row.total_price.as_deref())?.unwrap_or_default(),
        })
    }
}

/// Repository for reporting queries.
pub struct ReportRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReportRepository<'a> {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Count, min, max, average and sum of unit prices, optionally within
    /// one collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if an aggregate cannot be
    /// read back as a decimal.
    #[instrument(skip(self))]
    pub async fn price_summary(
        &self,
        collection_id: Option<CollectionId>,
    ) -> Result<PriceSummary, RepositoryError> {
        let collection_id = collection_id.map(|id| id.as_i32());
        let row = sqlx::query_as::<_, PriceSummaryRow>(
            r"
            SELECT COUNT(*) AS count,
                   CAST(MIN(unit_price) AS TEXT) AS min_price,
                   CAST(MAX(unit_price) AS TEXT) AS max_price,
                   CAST(AVG(unit_price) AS TEXT) AS avg_price,
                   CAST(SUM(unit_price) AS TEXT) AS total_price
            FROM store_product
            WHERE ? IS NULL OR collection_id = ?
            ",
        )
        .bind(collection_id)
        .bind(collection_id)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Every product with its collection, joined in one query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn products_with_collection(
        &self,
    ) -> Result<Vec<ProductWithCollection>, RepositoryError> {
        ProductRepository::new(self.pool).list_with_collection().await
    }

    /// The latest orders with customers and lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn recent_orders(&self, limit: u32) -> Result<Vec<OrderDetail>, RepositoryError> {
        OrderRepository::new(self.pool).recent(limit).await
    }

    /// Products that appear on at least one order, by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn ordered_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM store_product p
            WHERE p.id IN (SELECT DISTINCT product_id FROM store_orderitem)
            ORDER BY p.title, p.id
            "
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
