//! Collection repository.

use sqlx::SqlitePool;
use tracing::instrument;

use storehouse_core::{CollectionId, ProductId};

use super::{RepositoryError, map_delete_error, map_write_error};
use crate::models::{Collection, CreateCollectionInput, UpdateCollectionInput};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CollectionRow {
    pub(crate) id: i32,
    pub(crate) title: String,
    pub(crate) featured_product_id: Option<i32>,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: CollectionId::new(row.id),
            title: row.title,
            featured_product_id: row.featured_product_id.map(ProductId::new),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for collection database operations.
pub struct CollectionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CollectionRepository<'a> {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for a blank title or a featured
    /// product that does not exist.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: &CreateCollectionInput) -> Result<Collection, RepositoryError> {
        input.validate()?;

        let row = sqlx::query_as::<_, CollectionRow>(
            r"
            INSERT INTO store_collection (title, featured_product_id)
            VALUES (?, ?)
            RETURNING id, title, featured_product_id
            ",
        )
        .bind(input.title.trim())
        .bind(input.featured_product_id.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    /// Get a collection by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CollectionId) -> Result<Option<Collection>, RepositoryError> {
        let row = sqlx::query_as::<_, CollectionRow>(
            "SELECT id, title, featured_product_id FROM store_collection WHERE id = ?",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all collections ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Collection>, RepositoryError> {
        let rows = sqlx::query_as::<_, CollectionRow>(
            "SELECT id, title, featured_product_id FROM store_collection ORDER BY title, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Number of products in a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products_count(&self, id: CollectionId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM store_product WHERE collection_id = ?")
                .bind(id.as_i32())
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Update a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection doesn't exist.
    /// Returns `RepositoryError::Invalid` for a blank title or a featured
    /// product that does not exist.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: CollectionId,
        input: &UpdateCollectionInput,
    ) -> Result<Collection, RepositoryError> {
        input.validate()?;

        let (set_featured, featured) = match input.featured_product_id {
            Some(featured) => (true, featured.map(|p| p.as_i32())),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, CollectionRow>(
            r"
            UPDATE store_collection
            SET
                title = COALESCE(?, title),
                featured_product_id = CASE WHEN ? THEN ? ELSE featured_product_id END
            WHERE id = ?
            RETURNING id, title, featured_product_id
            ",
        )
        .bind(input.title.as_deref().map(str::trim))
        .bind(set_featured)
        .bind(featured)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Set or clear the featured product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection doesn't exist.
    pub async fn set_featured_product(
        &self,
        id: CollectionId,
        product_id: Option<ProductId>,
    ) -> Result<Collection, RepositoryError> {
        self.update(
            id,
            &UpdateCollectionInput {
                title: None,
                featured_product_id: Some(product_id),
            },
        )
        .await
    }

    /// Delete a collection.
    ///
    /// # Returns
    ///
    /// Returns `true` if the collection was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` while products still belong to it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CollectionId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store_collection WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error("collection", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete several collections at once; all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` if any of them still has products.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(&self, ids: &[CollectionId]) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(CollectionId::as_i32).collect();
        super::delete_many(self.pool, "store_collection", &ids).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn input(title: &str) -> CreateCollectionInput {
        CreateCollectionInput {
            title: title.to_owned(),
            featured_product_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_ordered_by_title() {
        let pool = test_support::pool().await;
        let repo = CollectionRepository::new(&pool);
        repo.create(&input("Toys")).await.unwrap();
        repo.create(&input("Games")).await.unwrap();

        let titles: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Games", "Toys"]);
    }

    #[tokio::test]
    async fn test_update_title_and_clear_featured() {
        let pool = test_support::pool().await;
        let repo = CollectionRepository::new(&pool);
        let created = repo.create(&input("Old")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &UpdateCollectionInput {
                    title: Some("Games".to_owned()),
                    featured_product_id: Some(None),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Games");
        assert_eq!(updated.featured_product_id, None);

        let missing = repo
            .update(CollectionId::new(999), &UpdateCollectionInput::default())
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_unknown_featured_product_is_invalid() {
        let pool = test_support::pool().await;
        let repo = CollectionRepository::new(&pool);
        let result = repo
            .create(&CreateCollectionInput {
                title: "Games".to_owned(),
                featured_product_id: Some(ProductId::new(42)),
            })
            .await;
        assert!(matches!(result, Err(RepositoryError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let pool = test_support::pool().await;
        let repo = CollectionRepository::new(&pool);
        assert!(matches!(
            repo.create(&input(" ")).await,
            Err(RepositoryError::Invalid(_))
        ));
    }
}
