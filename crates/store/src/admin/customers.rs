//! Customer changelist.

use futures::FutureExt;
use futures::future::BoxFuture;
use sqlx::SqlitePool;

use storehouse_core::{CustomerId, Membership};

use super::actions::ActionOutcome;
use super::listing::ChangeListRow;
use super::table::{FilterOption, ListColumn, ListFilter, ModelAdmin, SearchField};
use super::{AdminError, AdminModel, invalid_value};
use crate::db::{CustomerRepository, RepositoryError};

// Customers with no orders still appear, with a count of zero.
const SOURCE: &str = r"
    SELECT c.id, c.first_name, c.last_name, c.membership, COUNT(o.id) AS orders_count
    FROM store_customer c
    LEFT JOIN store_order o ON o.customer_id = c.id
    GROUP BY c.id, c.first_name, c.last_name, c.membership
";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CustomerListRow {
    id: i32,
    first_name: String,
    last_name: String,
    membership: Membership,
    orders_count: i64,
}

impl ChangeListRow for CustomerListRow {
    fn id(&self) -> i32 {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.membership.label().to_string(),
            self.orders_count.to_string(),
        ]
    }
}

pub(crate) fn model_admin() -> ModelAdmin {
    let memberships = Membership::ALL
        .iter()
        .map(|m| FilterOption::new(m.code(), m.label()))
        .collect();

    ModelAdmin::new(AdminModel::Customer, SOURCE)
        .column(ListColumn::sortable("first_name", "First name"))
        .column(ListColumn::sortable("last_name", "Last name"))
        .column(ListColumn::sortable("membership", "Membership").editable())
        .column(ListColumn::sortable("orders_count", "Orders").computed())
        .filter(ListFilter::select(
            "membership",
            "Membership",
            "membership",
            memberships,
        ))
        .search(SearchField::contains("first_name"))
        .search(SearchField::contains("last_name"))
        .ordering(&["first_name", "last_name"])
        .action("delete_selected", "Delete selected customers", delete_selected)
}

fn delete_selected<'a>(
    pool: &'a SqlitePool,
    ids: &'a [i32],
) -> BoxFuture<'a, Result<ActionOutcome, RepositoryError>> {
    async move {
        let ids: Vec<CustomerId> = ids.iter().copied().map(CustomerId::new).collect();
        let deleted = CustomerRepository::new(pool).delete_many(&ids).await?;
        Ok(ActionOutcome::new(
            "delete_selected",
            deleted,
            format!("Successfully deleted {deleted} customers."),
        ))
    }
    .boxed()
}

/// Apply a list-editable change.
pub(crate) async fn update_field(
    pool: &SqlitePool,
    id: i32,
    field: &str,
    value: &str,
) -> Result<(), AdminError> {
    if field != "membership" {
        return Err(AdminError::NotEditable {
            model: AdminModel::Customer,
            field: field.to_string(),
        });
    }

    let membership: Membership = value
        .trim()
        .parse()
        .map_err(|e: storehouse_core::CodeError| invalid_value(field, e.to_string()))?;
    CustomerRepository::new(pool)
        .set_membership(CustomerId::new(id), membership)
        .await
        .map_err(|e| AdminError::from_field(field, e))?;

    Ok(())
}
