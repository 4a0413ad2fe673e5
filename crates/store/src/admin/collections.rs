//! Collection changelist.

use futures::FutureExt;
use futures::future::BoxFuture;
use sqlx::SqlitePool;

use storehouse_core::CollectionId;

use super::AdminModel;
use super::actions::ActionOutcome;
use super::listing::ChangeListRow;
use super::table::{ListColumn, ModelAdmin, SearchField};
use crate::db::{CollectionRepository, RepositoryError};

const SOURCE: &str = r"
    SELECT c.id, c.title, COUNT(p.id) AS products_count
    FROM store_collection c
    LEFT JOIN store_product p ON p.collection_id = c.id
    GROUP BY c.id, c.title
";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CollectionListRow {
    id: i32,
    title: String,
    products_count: i64,
}

impl ChangeListRow for CollectionListRow {
    fn id(&self) -> i32 {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![self.title.clone(), self.products_count.to_string()]
    }
}

pub(crate) fn model_admin() -> ModelAdmin {
    ModelAdmin::new(AdminModel::Collection, SOURCE)
        .column(ListColumn::sortable("title", "Title"))
        .column(ListColumn::sortable("products_count", "Products").computed())
        .search(SearchField::contains("title"))
        .ordering(&["title"])
        .action("delete_selected", "Delete selected collections", delete_selected)
}

fn delete_selected<'a>(
    pool: &'a SqlitePool,
    ids: &'a [i32],
) -> BoxFuture<'a, Result<ActionOutcome, RepositoryError>> {
    async move {
        let ids: Vec<CollectionId> = ids.iter().copied().map(CollectionId::new).collect();
        let deleted = CollectionRepository::new(pool).delete_many(&ids).await?;
        Ok(ActionOutcome::new(
            "delete_selected",
            deleted,
            format!("Successfully deleted {deleted} collections."),
        ))
    }
    .boxed()
}
