//! Product changelist.

use futures::FutureExt;
use futures::future::BoxFuture;
use sqlx::SqlitePool;

use storehouse_core::{InventoryStatus, Price, ProductId};

use super::actions::ActionOutcome;
use super::listing::ChangeListRow;
use super::table::{FilterOption, InlineConfig, ListColumn, ListFilter, ModelAdmin, SearchField};
use super::{AdminError, AdminModel, invalid_value};
use crate::db::{ProductRepository, RepositoryError};

const SOURCE: &str = r"
    SELECT p.id, p.title, p.unit_price, CAST(p.unit_price AS TEXT) AS unit_price_text,
           p.inventory, p.collection_id, c.title AS collection_title
    FROM store_product p
    INNER JOIN store_collection c ON c.id = p.collection_id
";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductListRow {
    id: i32,
    title: String,
    unit_price_text: String,
    inventory: i32,
    collection_title: String,
}

impl ChangeListRow for ProductListRow {
    fn id(&self) -> i32 {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        let unit_price = self
            .unit_price_text
            .parse::<Price>()
            .map_or_else(|_| self.unit_price_text.clone(), |p| p.to_string());
        vec![
            self.title.clone(),
            unit_price,
            self.inventory.to_string(),
            InventoryStatus::classify(self.inventory).label().to_string(),
            self.collection_title.clone(),
        ]
    }
}

pub(crate) fn model_admin() -> ModelAdmin {
    let low = format!("inventory < {}", InventoryStatus::LOW_THRESHOLD);
    let ok = format!("inventory >= {}", InventoryStatus::LOW_THRESHOLD);

    ModelAdmin::new(AdminModel::Product, SOURCE)
        .column(ListColumn::sortable("title", "Title"))
        .column(ListColumn::sortable("unit_price", "Unit price").editable())
        .column(ListColumn::sortable("inventory", "Inventory").editable())
        .column(
            ListColumn::new("inventory_status", "Inventory status")
                .sort_by("inventory")
                .computed(),
        )
        .column(
            ListColumn::new("collection_title", "Collection")
                .sort_by("collection_title")
                .computed(),
        )
        .filter(ListFilter::related(
            "collection",
            "Collection",
            "collection_id",
            "store_collection",
            "title",
        ))
        .filter(ListFilter::select(
            "inventory",
            "Inventory",
            "inventory",
            vec![
                FilterOption::when("low", "Low", &low),
                FilterOption::when("ok", "OK", &ok),
            ],
        ))
        .search(SearchField::contains("title"))
        .ordering(&["title"])
        .inline(InlineConfig::new("tags", "Tags"))
        .action("clear_inventory", "Clear inventory", clear_inventory)
        .action("delete_selected", "Delete selected products", delete_selected)
}

fn product_ids(ids: &[i32]) -> Vec<ProductId> {
    ids.iter().copied().map(ProductId::new).collect()
}

fn clear_inventory<'a>(
    pool: &'a SqlitePool,
    ids: &'a [i32],
) -> BoxFuture<'a, Result<ActionOutcome, RepositoryError>> {
    async move {
        let updated = ProductRepository::new(pool)
            .clear_inventory(&product_ids(ids))
            .await?;
        Ok(ActionOutcome::new(
            "clear_inventory",
            updated,
            format!("{updated} products were successfully updated."),
        ))
    }
    .boxed()
}

fn delete_selected<'a>(
    pool: &'a SqlitePool,
    ids: &'a [i32],
) -> BoxFuture<'a, Result<ActionOutcome, RepositoryError>> {
    async move {
        let deleted = ProductRepository::new(pool)
            .delete_many(&product_ids(ids))
            .await?;
        Ok(ActionOutcome::new(
            "delete_selected",
            deleted,
            format!("Successfully deleted {deleted} products."),
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
    let repo = ProductRepository::new(pool);
    let id = ProductId::new(id);

    match field {
        "unit_price" => {
            let price: Price = value
                .trim()
                .parse()
                .map_err(|e: storehouse_core::PriceError| invalid_value(field, e.to_string()))?;
            repo.set_unit_price(id, price)
                .await
                .map_err(|e| AdminError::from_field(field, e))?;
        }
        "inventory" => {
            let inventory: i32 = value
                .trim()
                .parse()
                .map_err(|_| invalid_value(field, format!("'{value}' is not a whole number")))?;
            repo.set_inventory(id, inventory)
                .await
                .map_err(|e| AdminError::from_field(field, e))?;
        }
        _ => {
            return Err(AdminError::NotEditable {
                model: AdminModel::Product,
                field: field.to_string(),
            });
        }
    }

    Ok(())
}
