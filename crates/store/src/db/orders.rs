//! Order repository.
//!
//! Order items capture the product's price when they are written; later price
//! changes on the product do not reach existing items.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::instrument;

use storehouse_core::{CustomerId, OrderId, OrderItemId, PaymentStatus, Price, ProductId};

use super::customers::{CUSTOMER_COLUMNS, CustomerRow};
use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::{RepositoryError, map_delete_error, map_write_error, parse_price, push_id_list};
use crate::models::order::NewOrderItem;
use crate::models::{
    CreateOrderInput, Customer, Order, OrderDetail, OrderItem, OrderLine, Product,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    placed_at: DateTime<Utc>,
    payment_status: PaymentStatus,
    customer_id: i32,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            placed_at: row.placed_at,
            payment_status: row.payment_status,
            customer_id: CustomerId::new(row.customer_id),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i16,
    unit_price: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            unit_price: parse_price("order item unit_price", &row.unit_price)?,
        })
    }
}

/// An order joined with its customer. The customer's columns keep their
/// names, so the order's own id is aliased.
#[derive(Debug, sqlx::FromRow)]
struct OrderWithCustomerRow {
    order_id: i32,
    placed_at: DateTime<Utc>,
    payment_status: PaymentStatus,
    #[sqlx(flatten)]
    customer: CustomerRow,
}

impl TryFrom<OrderWithCustomerRow> for (Order, Customer) {
    type Error = RepositoryError;

    fn try_from(row: OrderWithCustomerRow) -> Result<Self, Self::Error> {
        let customer = Customer::try_from(row.customer)?;
        let order = Order {
            id: OrderId::new(row.order_id),
            placed_at: row.placed_at,
            payment_status: row.payment_status,
            customer_id: customer.id,
        };
        Ok((order, customer))
    }
}

/// An order item joined with its product.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    item_id: i32,
    order_id: i32,
    quantity: i16,
    item_unit_price: String,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        let product = Product::try_from(row.product)?;
        let item = OrderItem {
            id: OrderItemId::new(row.item_id),
            order_id: OrderId::new(row.order_id),
            product_id: product.id,
            quantity: row.quantity,
            unit_price: parse_price("order item unit_price", &row.item_unit_price)?,
        };
        Ok(Self { item, product })
    }
}

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, product_id, quantity, CAST(unit_price AS TEXT) AS unit_price";

fn select_with_customer() -> String {
    format!(
        r"
        SELECT o.id AS order_id, o.placed_at, o.payment_status, {CUSTOMER_COLUMNS}
        FROM store_order o
        INNER JOIN store_customer cu ON cu.id = o.customer_id
        "
    )
}

async fn current_price(
    conn: &mut SqliteConnection,
    product_id: ProductId,
) -> Result<Price, RepositoryError> {
    let price: Option<String> =
        sqlx::query_scalar("SELECT CAST(unit_price AS TEXT) FROM store_product WHERE id = ?")
            .bind(product_id.as_i32())
            .fetch_optional(&mut *conn)
            .await?;

    let price = price.ok_or_else(|| {
        RepositoryError::Invalid(format!("product {product_id} does not exist"))
    })?;
    parse_price("unit_price", &price)
}

async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<OrderItem, RepositoryError> {
    item.validate()?;

    let unit_price = match item.unit_price {
        Some(price) => price,
        None => current_price(&mut *conn, item.product_id).await?,
    };

    let row = sqlx::query_as::<_, OrderItemRow>(&format!(
        r"
        INSERT INTO store_orderitem (order_id, product_id, quantity, unit_price)
        VALUES (?, ?, ?, ?)
        RETURNING {ORDER_ITEM_COLUMNS}
        "
    ))
    .bind(order_id.as_i32())
    .bind(item.product_id.as_i32())
    .bind(item.quantity)
    .bind(unit_price.to_string())
    .fetch_one(&mut *conn)
    .await
    .map_err(map_write_error)?;

    row.try_into()
}

/// Load the lines of several orders in one query, grouped by order.
async fn lines_for(
    pool: &SqlitePool,
    order_ids: &[i32],
) -> Result<HashMap<i32, Vec<OrderLine>>, RepositoryError> {
    let mut grouped: HashMap<i32, Vec<OrderLine>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        r"
        SELECT oi.id AS item_id, oi.order_id, oi.quantity,
               CAST(oi.unit_price AS TEXT) AS item_unit_price,
               {PRODUCT_COLUMNS}
        FROM store_orderitem oi
        INNER JOIN store_product p ON p.id = oi.product_id
        WHERE oi.order_id IN"
    ));
    push_id_list(&mut qb, order_ids);
    qb.push(" ORDER BY oi.order_id, oi.id");

    let rows = qb.build_query_as::<OrderLineRow>().fetch_all(pool).await?;
    for row in rows {
        let line = OrderLine::try_from(row)?;
        grouped
            .entry(line.item.order_id.as_i32())
            .or_default()
            .push(line);
    }
    Ok(grouped)
}

/// Attach the lines to already loaded orders, keeping their order.
pub(crate) async fn with_lines(
    pool: &SqlitePool,
    orders: Vec<(Order, Customer)>,
) -> Result<Vec<OrderDetail>, RepositoryError> {
    let ids: Vec<i32> = orders.iter().map(|(order, _)| order.id.as_i32()).collect();
    let mut lines = lines_for(pool, &ids).await?;

    Ok(orders
        .into_iter()
        .map(|(order, customer)| OrderDetail {
            lines: lines.remove(&order.id.as_i32()).unwrap_or_default(),
            order,
            customer,
        })
        .collect())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Place an order with its items, in one transaction.
    ///
    /// Items without an explicit price take the product's current price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the customer or a product does
    /// not exist or a quantity is negative; nothing is written in that case.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id, items = input.items.len()))]
    pub async fn create(&self, input: &CreateOrderInput) -> Result<Order, RepositoryError> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO store_order (placed_at, payment_status, customer_id)
            VALUES (?, ?, ?)
            RETURNING id, placed_at, payment_status, customer_id
            ",
        )
        .bind(Utc::now())
        .bind(input.payment_status)
        .bind(input.customer_id.as_i32())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;
        let order = Order::from(row);

        for item in &input.items {
            insert_item(&mut *tx, order.id, item).await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %order.id, "order placed");
        Ok(order)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, placed_at, payment_status, customer_id FROM store_order WHERE id = ?",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an order with its customer and its lines (products loaded).
    ///
    /// Two queries: the order joined with its customer, then every line
    /// joined with its product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderWithCustomerRow>(&format!(
            "{} WHERE o.id = ?",
            select_with_customer()
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let pair: (Order, Customer) = row.try_into()?;
        let details = with_lines(self.pool, vec![pair]).await?;
        Ok(details.into_iter().next())
    }

    /// Most recent orders with customers and lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn recent(&self, limit: u32) -> Result<Vec<OrderDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderWithCustomerRow>(&format!(
            "{} ORDER BY o.placed_at DESC, o.id DESC LIMIT ?",
            select_with_customer()
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<(Order, Customer)>, _>>()?;
        with_lines(self.pool, orders).await
    }

    /// Orders placed by a customer, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, placed_at, payment_status, customer_id
            FROM store_order
            WHERE customer_id = ?
            ORDER BY placed_at, id
            ",
        )
        .bind(customer_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Change the payment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    #[instrument(skip(self))]
    pub async fn set_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE store_order SET payment_status = ?
            WHERE id = ?
            RETURNING id, placed_at, payment_status, customer_id
            ",
        )
        .bind(status)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Get a single order item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get_item(&self, id: OrderItemId) -> Result<Option<OrderItem>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM store_orderitem WHERE id = ?"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Number of items on an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, order_id: OrderId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM store_orderitem WHERE order_id = ?")
                .bind(order_id.as_i32())
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Add an item to an existing order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the order or product does not
    /// exist or the quantity is negative.
    #[instrument(skip(self, item))]
    pub async fn add_item(
        &self,
        order_id: OrderId,
        item: &NewOrderItem,
    ) -> Result<OrderItem, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        insert_item(&mut *conn, order_id, item).await
    }

    /// Change the quantity and, optionally, the captured price of an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Invalid` for a negative quantity.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        id: OrderItemId,
        quantity: i16,
        unit_price: Option<Price>,
    ) -> Result<OrderItem, RepositoryError> {
        crate::models::check_quantity("quantity", quantity)?;

        let row = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            UPDATE store_orderitem
            SET quantity = ?, unit_price = COALESCE(?, unit_price)
            WHERE id = ?
            RETURNING {ORDER_ITEM_COLUMNS}
            "
        ))
        .bind(quantity)
        .bind(unit_price.map(|p| p.to_string()))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Remove an item from its order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: OrderItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store_orderitem WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` while the order still has items.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store_order WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error("order", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete several orders at once; all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` if any of them still has items.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(&self, ids: &[OrderId]) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(OrderId::as_i32).collect();
        super::delete_many(self.pool, "store_order", &ids).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use storehouse_core::{Email, Membership};

    use super::*;
    use crate::db::test_support;
    use crate::db::{CollectionRepository, CustomerRepository, ProductRepository};
    use crate::models::{CreateCollectionInput, CreateCustomerInput, CreateProductInput};

    struct Fixture {
        pool: SqlitePool,
        customer: Customer,
        product: Product,
    }

    async fn fixture() -> Fixture {
        let pool = test_support::pool().await;
        let collection = CollectionRepository::new(&pool)
            .create(&CreateCollectionInput {
                title: "Games".to_owned(),
                featured_product_id: None,
            })
            .await
            .unwrap();
        let product = ProductRepository::new(&pool)
            .create(&CreateProductInput {
                title: "Chess".to_owned(),
                slug: None,
                description: String::new(),
                unit_price: "10.00".parse().unwrap(),
                inventory: 5,
                collection_id: collection.id,
                promotions: vec![],
            })
            .await
            .unwrap();
        let customer = CustomerRepository::new(&pool)
            .create(&CreateCustomerInput {
                first_name: "Ann".to_owned(),
                last_name: "Lee".to_owned(),
                email: Email::parse("ann@example.com").unwrap(),
                phone: "1".to_owned(),
                birth_date: None,
                membership: Membership::Silver,
            })
            .await
            .unwrap();
        Fixture {
            pool,
            customer,
            product,
        }
    }

    fn line(product: ProductId, quantity: i16) -> NewOrderItem {
        NewOrderItem {
            product_id: product,
            quantity,
            unit_price: None,
        }
    }

    #[tokio::test]
    async fn test_items_snapshot_price() {
        let f = fixture().await;
        let repo = OrderRepository::new(&f.pool);
        let order = repo
            .create(&CreateOrderInput {
                customer_id: f.customer.id,
                payment_status: PaymentStatus::Pending,
                items: vec![line(f.product.id, 2)],
            })
            .await
            .unwrap();

        ProductRepository::new(&f.pool)
            .set_unit_price(f.product.id, "15.00".parse().unwrap())
            .await
            .unwrap();

        let detail = repo.get_detail(order.id).await.unwrap().unwrap();
        assert_eq!(detail.customer.id, f.customer.id);
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].item.unit_price.to_string(), "10.00");
        assert_eq!(detail.lines[0].product.unit_price.to_string(), "15.00");
        assert_eq!(detail.total().to_string(), "20.00");
    }

    #[tokio::test]
    async fn test_create_is_atomic() {
        let f = fixture().await;
        let repo = OrderRepository::new(&f.pool);
        let err = repo
            .create(&CreateOrderInput {
                customer_id: f.customer.id,
                payment_status: PaymentStatus::Pending,
                items: vec![line(f.product.id, 1), line(ProductId::new(999), 1)],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid(_)));
        assert!(repo.list_for_customer(f.customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_customer_is_invalid() {
        let f = fixture().await;
        let err = OrderRepository::new(&f.pool)
            .create(&CreateOrderInput {
                customer_id: CustomerId::new(999),
                payment_status: PaymentStatus::Pending,
                items: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_item_edits_and_protected_delete() {
        let f = fixture().await;
        let repo = OrderRepository::new(&f.pool);
        let order = repo
            .create(&CreateOrderInput {
                customer_id: f.customer.id,
                payment_status: PaymentStatus::Pending,
                items: vec![line(f.product.id, 1)],
            })
            .await
            .unwrap();
        let detail = repo.get_detail(order.id).await.unwrap().unwrap();
        let item_id = detail.lines[0].item.id;

        let updated = repo.update_item(item_id, 4, None).await.unwrap();
        assert_eq!(updated.quantity, 4);
        assert_eq!(updated.unit_price.to_string(), "10.00");

        assert!(matches!(
            repo.delete(order.id).await,
            Err(RepositoryError::Protected(_))
        ));
        assert!(matches!(
            ProductRepository::new(&f.pool).delete(f.product.id).await,
            Err(RepositoryError::Protected(_))
        ));

        assert!(repo.delete_item(item_id).await.unwrap());
        assert_eq!(repo.item_count(order.id).await.unwrap(), 0);
        assert!(repo.delete(order.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_payment_status_and_recent() {
        let f = fixture().await;
        let repo = OrderRepository::new(&f.pool);
        let first = repo
            .create(&CreateOrderInput {
                customer_id: f.customer.id,
                payment_status: PaymentStatus::Pending,
                items: vec![line(f.product.id, 1)],
            })
            .await
            .unwrap();
        let second = repo
            .create(&CreateOrderInput {
                customer_id: f.customer.id,
                payment_status: PaymentStatus::Pending,
                items: vec![],
            })
            .await
            .unwrap();

        let paid = repo
            .set_payment_status(first.id, PaymentStatus::Complete)
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Complete);

        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].order.id, second.id);
        assert!(recent[0].lines.is_empty());
        assert_eq!(recent[1].lines.len(), 1);

        assert_eq!(repo.recent(1).await.unwrap().len(), 1);
    }
}
