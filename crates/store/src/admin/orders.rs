//! Order changelist and the order items inline.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use sqlx::SqlitePool;

use storehouse_core::{OrderId, OrderItemId, PaymentStatus, Price, ProductId};

use super::actions::ActionOutcome;
use super::listing::ChangeListRow;
use super::table::{FilterOption, InlineConfig, ListColumn, ListFilter, ModelAdmin};
use super::{AdminError, AdminModel, invalid_value};
use crate::db::{OrderRepository, RepositoryError};
use crate::models::{NewOrderItem, OrderItem};

const SOURCE: &str = r"
    SELECT o.id, o.placed_at, o.payment_status, o.customer_id,
           cu.first_name || ' ' || cu.last_name AS customer
    FROM store_order o
    INNER JOIN store_customer cu ON cu.id = o.customer_id
";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderListRow {
    id: i32,
    placed_at: DateTime<Utc>,
    customer: String,
}

impl ChangeListRow for OrderListRow {
    fn id(&self) -> i32 {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.placed_at.format("%Y-%m-%d %H:%M").to_string(),
            self.customer.clone(),
        ]
    }
}

pub(crate) fn model_admin() -> ModelAdmin {
    let statuses = PaymentStatus::ALL
        .iter()
        .map(|s| FilterOption::new(s.code(), s.label()))
        .collect();

    ModelAdmin::new(AdminModel::Order, SOURCE)
        .column(ListColumn::sortable("id", "ID"))
        .column(ListColumn::sortable("placed_at", "Placed at"))
        .column(ListColumn::sortable("customer", "Customer"))
        .filter(ListFilter::select(
            "payment_status",
            "Payment status",
            "payment_status",
            statuses,
        ))
        .ordering(&["id"])
        .inline(InlineConfig::new("items", "Order items").bounds(1, 10))
        .action("delete_selected", "Delete selected orders", delete_selected)
}

fn delete_selected<'a>(
    pool: &'a SqlitePool,
    ids: &'a [i32],
) -> BoxFuture<'a, Result<ActionOutcome, RepositoryError>> {
    async move {
        let ids: Vec<OrderId> = ids.iter().copied().map(OrderId::new).collect();
        let deleted = OrderRepository::new(pool).delete_many(&ids).await?;
        Ok(ActionOutcome::new(
            "delete_selected",
            deleted,
            format!("Successfully deleted {deleted} orders."),
        ))
    }
    .boxed()
}

/// One row of the order items inline.
///
/// Without an `id` the row is added to the order; with one, the existing
/// item's quantity and price are changed.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemForm {
    /// Existing item, if editing.
    #[serde(default)]
    pub id: Option<OrderItemId>,
    /// Ordered product.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: i16,
    /// Price per unit; the product's current price for new rows when omitted.
    #[serde(default)]
    pub unit_price: Option<Price>,
}

async fn owned_item(
    repo: &OrderRepository<'_>,
    order_id: OrderId,
    item_id: OrderItemId,
) -> Result<OrderItem, AdminError> {
    repo.get_item(item_id)
        .await?
        .filter(|item| item.order_id == order_id)
        .ok_or(AdminError::NotFound)
}

pub(crate) async fn save_item(
    pool: &SqlitePool,
    inline: &InlineConfig,
    order_id: OrderId,
    form: &OrderItemForm,
) -> Result<OrderItem, AdminError> {
    let repo = OrderRepository::new(pool);
    if repo.get(order_id).await?.is_none() {
        return Err(AdminError::NotFound);
    }

    if let Some(item_id) = form.id {
        let item = owned_item(&repo, order_id, item_id).await?;
        if item.product_id != form.product_id {
            return Err(invalid_value(
                "product_id",
                "the product of an existing item cannot be changed".to_string(),
            ));
        }
        return repo
            .update_item(item_id, form.quantity, form.unit_price)
            .await
            .map_err(|e| AdminError::from_field("quantity", e));
    }

    let count = repo.item_count(order_id).await?;
    if let Some(max) = inline.max_num
        && count >= i64::from(max)
    {
        return Err(AdminError::InlineLimit(format!(
            "an order can have at most {max} items"
        )));
    }

    repo.add_item(
        order_id,
        &NewOrderItem {
            product_id: form.product_id,
            quantity: form.quantity,
            unit_price: form.unit_price,
        },
    )
    .await
    .map_err(|e| AdminError::from_field("quantity", e))
}

pub(crate) async fn delete_item(
    pool: &SqlitePool,
    inline: &InlineConfig,
    order_id: OrderId,
    item_id: OrderItemId,
) -> Result<(), AdminError> {
    let repo = OrderRepository::new(pool);
    owned_item(&repo, order_id, item_id).await?;

    let count = repo.item_count(order_id).await?;
    if count <= i64::from(inline.min_num) {
        return Err(AdminError::InlineLimit(format!(
            "an order needs at least {} item(s)",
            inline.min_num
        )));
    }

    repo.delete_item(item_id).await?;
    Ok(())
}
