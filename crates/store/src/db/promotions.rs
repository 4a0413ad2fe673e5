//! Promotion repository.

use sqlx::SqlitePool;
use tracing::instrument;

use storehouse_core::{ProductId, PromotionId};

use super::RepositoryError;
use super::products::{PRODUCT_COLUMNS, ProductRow};
use crate::models::{CreatePromotionInput, Product, Promotion};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PromotionRow {
    id: i32,
    description: String,
    discount: f64,
}

impl From<PromotionRow> for Promotion {
    fn from(row: PromotionRow) -> Self {
        Self {
            id: PromotionId::new(row.id),
            description: row.description,
            discount: row.discount,
        }
    }
}

/// Repository for promotion database operations.
pub struct PromotionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PromotionRepository<'a> {
    /// Create a new promotion repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a promotion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if validation fails.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &CreatePromotionInput) -> Result<Promotion, RepositoryError> {
        input.validate()?;

        let row = sqlx::query_as::<_, PromotionRow>(
            "INSERT INTO store_promotion (description, discount) VALUES (?, ?) RETURNING id, description, discount",
        )
        .bind(input.description.trim())
        .bind(input.discount)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// List all promotions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let rows = sqlx::query_as::<_, PromotionRow>(
            "SELECT id, description, discount FROM store_promotion ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Products a promotion applies to, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn products(&self, id: PromotionId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM store_product p
            INNER JOIN store_product_promotions pp ON pp.product_id = p.id
            WHERE pp.promotion_id = ?
            ORDER BY p.title, p.id
            "
        ))
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Delete a promotion; its product links go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: PromotionId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store_promotion WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a product carries a promotion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn applies_to(
        &self,
        id: PromotionId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let found: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM store_product_promotions WHERE promotion_id = ? AND product_id = ?",
        )
        .bind(id.as_i32())
        .bind(product_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(found.is_some())
    }
}
