//! Cart repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use storehouse_core::{CartId, CartItemId, ProductId};

use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::{RepositoryError, map_write_error};
use crate::models::{Cart, CartDetail, CartItem, CartLine, Product, check_quantity};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    quantity: i16,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    item_id: i32,
    cart_id: i32,
    quantity: i16,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let product = Product::try_from(row.product)?;
        Ok(Self {
            item: CartItem {
                id: CartItemId::new(row.item_id),
                cart_id: CartId::new(row.cart_id),
                product_id: product.id,
                quantity: row.quantity,
            },
            product,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO store_cart (created_at) VALUES (?) RETURNING id, created_at",
        )
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a cart with its lines (products loaded).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn get_detail(&self, id: CartId) -> Result<Option<CartDetail>, RepositoryError> {
        let cart = sqlx::query_as::<_, CartRow>("SELECT id, created_at FROM store_cart WHERE id = ?")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        let Some(cart) = cart else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            SELECT ci.id AS item_id, ci.cart_id, ci.quantity, {PRODUCT_COLUMNS}
            FROM store_cartitem ci
            INNER JOIN store_product p ON p.id = ci.product_id
            WHERE ci.cart_id = ?
            ORDER BY ci.id
            "
        ))
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<CartLine>, _>>()?;

        Ok(Some(CartDetail {
            cart: cart.into(),
            lines,
        }))
    }

    /// Put a product in a cart.
    ///
    /// Adding a product that is already in the cart increases its quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the cart or product does not
    /// exist or the quantity is negative.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i16,
    ) -> Result<CartItem, RepositoryError> {
        check_quantity("quantity", quantity)?;

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, cart_id, product_id, quantity
            FROM store_cartitem
            WHERE cart_id = ? AND product_id = ?
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(cart_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let row = if let Some(existing) = existing {
            let total = existing.quantity.checked_add(quantity).ok_or_else(|| {
                RepositoryError::Invalid("quantity exceeds the maximum of 32767".to_owned())
            })?;
            sqlx::query_as::<_, CartItemRow>(
                "UPDATE store_cartitem SET quantity = ? WHERE id = ? RETURNING id, cart_id, product_id, quantity",
            )
            .bind(total)
            .bind(existing.id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_as::<_, CartItemRow>(
                r"
                INSERT INTO store_cartitem (cart_id, product_id, quantity)
                VALUES (?, ?, ?)
                RETURNING id, cart_id, product_id, quantity
                ",
            )
            .bind(cart_id.as_i32())
            .bind(product_id.as_i32())
            .bind(quantity)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?
        };

        tx.commit().await?;
        Ok(row.into())
    }

    /// Remove a line from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(&self, id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store_cartitem WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a cart and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CartId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store_cart WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use crate::db::{CollectionRepository, ProductRepository};
    use crate::models::{CreateCollectionInput, CreateProductInput};

    async fn product(pool: &SqlitePool) -> Product {
        let collection = CollectionRepository::new(pool)
            .create(&CreateCollectionInput {
                title: "Games".to_owned(),
                featured_product_id: None,
            })
            .await
            .unwrap();
        ProductRepository::new(pool)
            .create(&CreateProductInput {
                title: "Chess".to_owned(),
                slug: None,
                description: String::new(),
                unit_price: "2.50".parse().unwrap(),
                inventory: 5,
                collection_id: collection.id,
                promotions: vec![],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_item_merges_quantities() {
        let pool = test_support::pool().await;
        let chess = product(&pool).await;
        let repo = CartRepository::new(&pool);
        let cart = repo.create().await.unwrap();

        let first = repo.add_item(cart.id, chess.id, 1).await.unwrap();
        let second = repo.add_item(cart.id, chess.id, 2).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 3);

        let detail = repo.get_detail(cart.id).await.unwrap().unwrap();
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.total().to_string(), "7.50");
    }

    #[tokio::test]
    async fn test_delete_cart_cascades_and_protects_product() {
        let pool = test_support::pool().await;
        let chess = product(&pool).await;
        let repo = CartRepository::new(&pool);
        let cart = repo.create().await.unwrap();
        repo.add_item(cart.id, chess.id, 1).await.unwrap();

        assert!(matches!(
            ProductRepository::new(&pool).delete(chess.id).await,
            Err(RepositoryError::Protected(_))
        ));

        assert!(repo.delete(cart.id).await.unwrap());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store_cartitem")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(ProductRepository::new(&pool).delete(chess.id).await.unwrap());
    }
}
