//! Product repository.
//!
//! Prices are written as decimal strings and read back through
//! `CAST(unit_price AS TEXT)`, so they never pass through a float.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::instrument;

use storehouse_core::{CollectionId, Price, ProductId, PromotionId};

use super::{
    RepositoryError, map_delete_error, map_write_error, parse_price, push_id_list,
};
use crate::db::promotions::PromotionRow;
use crate::models::product::validate_unit_price;
use crate::models::{
    Collection, CreateProductInput, Product, ProductWithCollection, Promotion, UpdateProductInput,
};

/// Columns decoded by [`ProductRow`], for a `store_product` aliased `p`.
pub(crate) const PRODUCT_COLUMNS: &str = r"
    p.id, p.title, p.slug, p.description,
    CAST(p.unit_price AS TEXT) AS unit_price,
    p.inventory, p.last_update, p.collection_id
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i32,
    title: String,
    slug: String,
    description: String,
    unit_price: String,
    inventory: i32,
    last_update: DateTime<Utc>,
    collection_id: i32,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            title: row.title,
            slug: row.slug,
            description: row.description,
            unit_price: parse_price("unit_price", &row.unit_price)?,
            inventory: row.inventory,
            last_update: row.last_update,
            collection_id: CollectionId::new(row.collection_id),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductWithCollectionRow {
    #[sqlx(flatten)]
    product: ProductRow,
    collection_title: String,
    collection_featured_product_id: Option<i32>,
}

impl TryFrom<ProductWithCollectionRow> for ProductWithCollection {
    type Error = RepositoryError;

    fn try_from(row: ProductWithCollectionRow) -> Result<Self, Self::Error> {
        let product = Product::try_from(row.product)?;
        let collection = Collection {
            id: product.collection_id,
            title: row.collection_title,
            featured_product_id: row.collection_featured_product_id.map(ProductId::new),
        };
        Ok(Self {
            product,
            collection,
        })
    }
}

fn select_with_collection() -> String {
    format!(
        r"
        SELECT {PRODUCT_COLUMNS},
               c.title AS collection_title,
               c.featured_product_id AS collection_featured_product_id
        FROM store_product p
        INNER JOIN store_collection c ON c.id = p.collection_id
        "
    )
}

async fn fetch_product(
    conn: &mut SqliteConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM store_product p WHERE p.id = ?"
    ))
    .bind(id.as_i32())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(TryInto::try_into).transpose()
}

async fn replace_promotions(
    conn: &mut SqliteConnection,
    id: ProductId,
    promotions: &[PromotionId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM store_product_promotions WHERE product_id = ?")
        .bind(id.as_i32())
        .execute(&mut *conn)
        .await?;

    for promotion in promotions {
        sqlx::query(
            r"
            INSERT INTO store_product_promotions (product_id, promotion_id)
            VALUES (?, ?)
            ON CONFLICT (product_id, promotion_id) DO NOTHING
            ",
        )
        .bind(id.as_i32())
        .bind(promotion.as_i32())
        .execute(&mut *conn)
        .await
        .map_err(map_write_error)?;
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a product and attach its promotions, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if validation fails or the
    /// collection or a promotion does not exist.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: &CreateProductInput) -> Result<Product, RepositoryError> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO store_product
                (title, slug, description, unit_price, inventory, last_update, collection_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, title, slug, description, CAST(unit_price AS TEXT) AS unit_price,
                      inventory, last_update, collection_id
            ",
        )
        .bind(input.title.trim())
        .bind(input.effective_slug())
        .bind(&input.description)
        .bind(input.unit_price.to_string())
        .bind(input.inventory)
        .bind(Utc::now())
        .bind(input.collection_id.as_i32())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let product = Product::try_from(row)?;
        replace_promotions(&mut *tx, product.id, &input.promotions).await?;

        tx.commit().await?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut *conn, id).await
    }

    /// Get a product and its collection in one query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn get_with_collection(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductWithCollection>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductWithCollectionRow>(&format!(
            "{} WHERE p.id = ?",
            select_with_collection()
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List all products ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store_product p ORDER BY p.title, p.id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List all products with their collections, joined in one query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list_with_collection(&self) -> Result<Vec<ProductWithCollection>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductWithCollectionRow>(&format!(
            "{} ORDER BY p.title, p.id",
            select_with_collection()
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Update a product. Touches `last_update`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Invalid` if validation fails.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: ProductId,
        input: &UpdateProductInput,
    ) -> Result<Product, RepositoryError> {
        input.validate()?;

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE store_product
            SET
                title = COALESCE(?, title),
                slug = COALESCE(?, slug),
                description = COALESCE(?, description),
                unit_price = COALESCE(?, unit_price),
                inventory = COALESCE(?, inventory),
                collection_id = COALESCE(?, collection_id),
                last_update = ?
            WHERE id = ?
            RETURNING id, title, slug, description, CAST(unit_price AS TEXT) AS unit_price,
                      inventory, last_update, collection_id
            ",
        )
        .bind(input.title.as_deref().map(str::trim))
        .bind(input.slug.as_deref())
        .bind(input.description.as_deref())
        .bind(input.unit_price.map(|p| p.to_string()))
        .bind(input.inventory)
        .bind(input.collection_id.map(|c| c.as_i32()))
        .bind(Utc::now())
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Change the unit price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for a price below 1.
    pub async fn set_unit_price(
        &self,
        id: ProductId,
        unit_price: Price,
    ) -> Result<Product, RepositoryError> {
        validate_unit_price(unit_price)?;
        self.update(
            id,
            &UpdateProductInput {
                unit_price: Some(unit_price),
                ..UpdateProductInput::default()
            },
        )
        .await
    }

    /// Change the stock count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_inventory(&self, id: ProductId, inventory: i32) -> Result<Product, RepositoryError> {
        self.update(
            id,
            &UpdateProductInput {
                inventory: Some(inventory),
                ..UpdateProductInput::default()
            },
        )
        .await
    }

    /// Set the inventory of every listed product to zero.
    ///
    /// Runs as a single `UPDATE` inside one transaction and returns the
    /// number of rows changed. `last_update` is left as it was. An empty
    /// selection returns 0 without touching the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails; nothing is
    /// changed in that case.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn clear_inventory(&self, ids: &[ProductId]) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let mut tx = self.pool.begin().await?;

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE store_product SET inventory = 0 WHERE id IN");
        push_id_list(&mut qb, &ids);
        let result = qb.build().execute(&mut *tx).await?;

        tx.commit().await?;

        tracing::info!(updated = result.rows_affected(), "inventory cleared");
        Ok(result.rows_affected())
    }

    /// Replace the promotions attached to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Invalid` if a promotion does not exist.
    #[instrument(skip(self, promotions), fields(count = promotions.len()))]
    pub async fn set_promotions(
        &self,
        id: ProductId,
        promotions: &[PromotionId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if fetch_product(&mut *tx, id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }
        replace_promotions(&mut *tx, id, promotions).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Promotions attached to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn promotions(&self, id: ProductId) -> Result<Vec<Promotion>, RepositoryError> {
        let rows = sqlx::query_as::<_, PromotionRow>(
            r"
            SELECT pr.id, pr.description, pr.discount
            FROM store_promotion pr
            INNER JOIN store_product_promotions pp ON pp.promotion_id = pr.id
            WHERE pp.product_id = ?
            ORDER BY pr.id
            ",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Delete a product.
    ///
    /// A collection featuring it loses its featured product; promotion links
    /// go with it.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` while order or cart items
    /// reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store_product WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error("product", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete several products at once; all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` if any of them is still ordered or
    /// in a cart.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(&self, ids: &[ProductId]) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        super::delete_many(self.pool, "store_product", &ids).await
    }
}
