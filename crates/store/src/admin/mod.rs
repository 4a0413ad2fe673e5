//! Administrative customization layer.
//!
//! Each listed model has a [`ModelAdmin`] describing its changelist: columns
//! (stored, computed, list-editable), filters, search fields, ordering, page
//! size, inlines and bulk actions. [`AdminSite`] owns the registered admins
//! and runs changelist queries, list edits, actions and inline edits against
//! the store.
//!
//! # Example
//!
//! ```rust,ignore
//! let site = AdminSite::new(pool).with_list_per_page(config.list_per_page);
//! let page = site
//!     .changelist(AdminModel::Product, &ListQuery::new().sort("-inventory_status"))
//!     .await?;
//! let outcome = site
//!     .run_action(AdminModel::Product, "clear_inventory", &page.ids())
//!     .await?;
//! ```

pub mod actions;
mod collections;
mod customers;
pub mod listing;
mod orders;
mod products;
pub mod table;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::instrument;

use storehouse_core::{EntityKind, OrderId, OrderItemId, ProductId};
use storehouse_tags::{ContentObject, ContentRef, ContentTypeRegistry, TagError, TagRepository, TaggedItem};

use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::models::{OrderDetail, OrderItem};

pub use actions::{ActionHandler, ActionOutcome, ActionRegistry, RegisteredAction};
pub use listing::{ListPage, ListQuery, ListRow};
pub use orders::OrderItemForm;
pub use table::{
    FilterKind, FilterOption, InlineConfig, ListColumn, ListFilter, ModelAdmin, SearchField,
};

/// Models with a changelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminModel {
    Collection,
    Product,
    Customer,
    Order,
}

impl AdminModel {
    /// All admin models.
    pub const ALL: [Self; 4] = [Self::Collection, Self::Product, Self::Customer, Self::Order];

    /// Singular name (`product`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Product => "product",
            Self::Customer => "customer",
            Self::Order => "order",
        }
    }

    /// Plural name (`products`).
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Collection => "collections",
            Self::Product => "products",
            Self::Customer => "customers",
            Self::Order => "orders",
        }
    }

    /// Entity kind used for tagging.
    #[must_use]
    pub const fn entity_kind(self) -> EntityKind {
        match self {
            Self::Collection => EntityKind::Collection,
            Self::Product => EntityKind::Product,
            Self::Customer => EntityKind::Customer,
            Self::Order => EntityKind::Order,
        }
    }
}

impl fmt::Display for AdminModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdminModel {
    type Err = AdminError;

    /// Accepts the singular or plural name, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.name() == lower || m.plural() == lower)
            .ok_or_else(|| AdminError::UnknownModel(s.to_string()))
    }
}

/// Errors from the admin layer.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No admin is registered under that name.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The changelist has no such column.
    #[error("{model} has no column '{column}'")]
    UnknownColumn { model: AdminModel, column: String },

    /// The column exists but cannot be edited from the list.
    #[error("{model} field '{field}' is not list-editable")]
    NotEditable { model: AdminModel, field: String },

    /// Sort key is not a sortable column.
    #[error("cannot sort {model} by '{key}'")]
    UnknownSortKey { model: AdminModel, key: String },

    /// The changelist has no such filter.
    #[error("{model} has no filter '{filter}'")]
    UnknownFilter { model: AdminModel, filter: String },

    /// Value is not one of the filter's choices.
    #[error("'{value}' is not a valid choice for filter '{filter}'")]
    InvalidFilterValue { filter: String, value: String },

    /// No action registered under that name.
    #[error("{model} has no action '{action}'")]
    UnknownAction { model: AdminModel, action: String },

    /// Submitted value was rejected.
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Page number outside `1..=num_pages`.
    #[error("invalid page {page}: there are {num_pages} pages")]
    InvalidPage { page: u32, num_pages: u32 },

    /// An inline edit would break the inline's row bounds.
    #[error("{0}")]
    InlineLimit(String),

    /// Object does not exist.
    #[error("not found")]
    NotFound,

    /// Repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Tagging error.
    #[error(transparent)]
    Tags(#[from] TagError),
}

impl From<sqlx::Error> for AdminError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

impl AdminError {
    /// Attribute validation failures of a repository write to a field.
    pub(crate) fn from_field(field: &str, e: RepositoryError) -> Self {
        match e {
            RepositoryError::Invalid(message) => invalid_value(field, message),
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

pub(crate) fn invalid_value(field: &str, message: String) -> AdminError {
    AdminError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

/// Registry of model admins over one store.
#[derive(Debug, Clone)]
pub struct AdminSite {
    pool: SqlitePool,
    admins: BTreeMap<AdminModel, ModelAdmin>,
    content_types: ContentTypeRegistry,
}

impl AdminSite {
    /// Create a site with every model admin registered.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        let admins = [
            collections::model_admin(),
            products::model_admin(),
            customers::model_admin(),
            orders::model_admin(),
        ]
        .into_iter()
        .map(|admin| (admin.model, admin))
        .collect();

        Self {
            pool,
            admins,
            content_types: crate::content_types::registry(),
        }
    }

    /// Override the page size of every changelist.
    #[must_use]
    pub fn with_list_per_page(mut self, per_page: u32) -> Self {
        for admin in self.admins.values_mut() {
            admin.list_per_page = per_page.max(1);
        }
        self
    }

    /// The store this site edits.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Registered models.
    #[must_use]
    pub fn models(&self) -> Vec<AdminModel> {
        self.admins.keys().copied().collect()
    }

    /// Configuration for one model.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::UnknownModel` if the model has no admin.
    pub fn model_admin(&self, model: AdminModel) -> Result<&ModelAdmin, AdminError> {
        self.admins
            .get(&model)
            .ok_or_else(|| AdminError::UnknownModel(model.to_string()))
    }

    /// List one page of a model.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::UnknownSortKey`, `UnknownFilter`,
    /// `InvalidFilterValue` or `InvalidPage` for a bad query.
    #[instrument(skip(self, query), fields(page = ?query.page))]
    pub async fn changelist(
        &self,
        model: AdminModel,
        query: &ListQuery,
    ) -> Result<ListPage, AdminError> {
        let admin = self.model_admin(model)?;
        match model {
            AdminModel::Collection => {
                listing::changelist::<collections::CollectionListRow>(&self.pool, admin, query).await
            }
            AdminModel::Product => {
                listing::changelist::<products::ProductListRow>(&self.pool, admin, query).await
            }
            AdminModel::Customer => {
                listing::changelist::<customers::CustomerListRow>(&self.pool, admin, query).await
            }
            AdminModel::Order => {
                listing::changelist::<orders::OrderListRow>(&self.pool, admin, query).await
            }
        }
    }

    /// One changelist row, freshly read.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` if the object does not exist.
    pub async fn row(&self, model: AdminModel, id: i32) -> Result<ListRow, AdminError> {
        let admin = self.model_admin(model)?;
        let row = match model {
            AdminModel::Collection => {
                listing::fetch_row::<collections::CollectionListRow>(&self.pool, admin, id).await?
            }
            AdminModel::Product => {
                listing::fetch_row::<products::ProductListRow>(&self.pool, admin, id).await?
            }
            AdminModel::Customer => {
                listing::fetch_row::<customers::CustomerListRow>(&self.pool, admin, id).await?
            }
            AdminModel::Order => {
                listing::fetch_row::<orders::OrderListRow>(&self.pool, admin, id).await?
            }
        };
        row.ok_or(AdminError::NotFound)
    }

    /// Choices offered by a filter.
    ///
    /// Select filters return their fixed options; related filters list the
    /// rows of the related table.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::UnknownFilter` if the model has no such filter.
    pub async fn filter_choices(
        &self,
        model: AdminModel,
        key: &str,
    ) -> Result<Vec<FilterOption>, AdminError> {
        let filter = self
            .model_admin(model)?
            .get_filter(key)
            .ok_or_else(|| AdminError::UnknownFilter {
                model,
                filter: key.to_string(),
            })?;

        match &filter.kind {
            FilterKind::Select => Ok(filter.options.clone()),
            FilterKind::Related { table, label_expr } => {
                let rows: Vec<(i32, String)> = sqlx::query_as(&format!(
                    "SELECT id, {label_expr} FROM {table} ORDER BY {label_expr}, id"
                ))
                .fetch_all(&self.pool)
                .await?;

                Ok(rows
                    .into_iter()
                    .map(|(id, label)| FilterOption::new(&id.to_string(), &label))
                    .collect())
            }
        }
    }

    /// Change a list-editable field and return the refreshed row.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::UnknownColumn` or `NotEditable` for a field that
    /// cannot be edited, `InvalidValue` if the value is rejected and
    /// `NotFound` if the object does not exist.
    #[instrument(skip(self, value))]
    pub async fn update_editable(
        &self,
        model: AdminModel,
        id: i32,
        field: &str,
        value: &str,
    ) -> Result<ListRow, AdminError> {
        let column = self
            .model_admin(model)?
            .get_column(field)
            .ok_or_else(|| AdminError::UnknownColumn {
                model,
                column: field.to_string(),
            })?;
        if !column.editable {
            return Err(AdminError::NotEditable {
                model,
                field: field.to_string(),
            });
        }

        match model {
            AdminModel::Product => products::update_field(&self.pool, id, field, value).await?,
            AdminModel::Customer => customers::update_field(&self.pool, id, field, value).await?,
            AdminModel::Collection | AdminModel::Order => {
                return Err(AdminError::NotEditable {
                    model,
                    field: field.to_string(),
                });
            }
        }

        tracing::info!(%model, id, field, "list edit saved");
        self.row(model, id).await
    }

    /// Actions available on a model's changelist.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::UnknownModel` if the model has no admin.
    pub fn actions(&self, model: AdminModel) -> Result<Vec<&RegisteredAction>, AdminError> {
        Ok(self.model_admin(model)?.actions.iter().collect())
    }

    /// Run a bulk action on the selected ids.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::UnknownAction` for an unregistered name, or the
    /// action's repository error.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn run_action(
        &self,
        model: AdminModel,
        action: &str,
        ids: &[i32],
    ) -> Result<ActionOutcome, AdminError> {
        let registered = self
            .model_admin(model)?
            .actions
            .get(action)
            .ok_or_else(|| AdminError::UnknownAction {
                model,
                action: action.to_string(),
            })?;

        let outcome = registered.run(&self.pool, ids).await?;
        tracing::info!(%model, action, affected = outcome.affected, "{}", outcome.message);
        Ok(outcome)
    }

    fn inline(&self, model: AdminModel, key: &str) -> Result<&InlineConfig, AdminError> {
        self.model_admin(model)?
            .get_inline(key)
            .ok_or(AdminError::UnknownColumn {
                model,
                column: key.to_string(),
            })
    }

    /// Order change page: the order, its customer and its items with their
    /// products loaded.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` if the order does not exist.
    pub async fn order_change(&self, id: OrderId) -> Result<OrderDetail, AdminError> {
        OrderRepository::new(&self.pool)
            .get_detail(id)
            .await?
            .ok_or(AdminError::NotFound)
    }

    /// Save one row of the order items inline.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InlineLimit` when adding beyond the maximum,
    /// `NotFound` if the order or item does not exist (or the item belongs to
    /// another order) and `InvalidValue` for a rejected quantity.
    #[instrument(skip(self, form))]
    pub async fn save_order_item(
        &self,
        order_id: OrderId,
        form: &OrderItemForm,
    ) -> Result<OrderItem, AdminError> {
        let inline = self.inline(AdminModel::Order, "items")?;
        orders::save_item(&self.pool, inline, order_id, form).await
    }

    /// Delete one row of the order items inline.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InlineLimit` when the order would drop below its
    /// minimum number of items.
    #[instrument(skip(self))]
    pub async fn delete_order_item(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
    ) -> Result<(), AdminError> {
        let inline = self.inline(AdminModel::Order, "items")?;
        orders::delete_item(&self.pool, inline, order_id, item_id).await
    }

    /// Tags on a product.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` if the product does not exist.
    pub async fn product_tags(&self, id: ProductId) -> Result<Vec<TaggedItem>, AdminError> {
        let target = self.tags_target(AdminModel::Product, id.as_i32())?;
        self.require_product(id).await?;
        Ok(TagRepository::new(&self.pool).tags_for(target).await?)
    }

    /// Replace the tags on a product with the given labels.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` if the product does not exist and
    /// `AdminError::Tags` for an invalid label.
    #[instrument(skip(self, labels), fields(count = labels.len()))]
    pub async fn set_product_tags(
        &self,
        id: ProductId,
        labels: &[String],
    ) -> Result<Vec<TaggedItem>, AdminError> {
        let target = self.tags_target(AdminModel::Product, id.as_i32())?;
        self.require_product(id).await?;
        Ok(TagRepository::new(&self.pool)
            .replace_tags(target, labels)
            .await?)
    }

    /// Tag target for an object of a model that has a tags inline.
    fn tags_target(&self, model: AdminModel, id: i32) -> Result<ContentRef, AdminError> {
        self.inline(model, "tags")?;
        Ok(ContentRef::new(model.entity_kind(), id))
    }

    async fn require_product(&self, id: ProductId) -> Result<(), AdminError> {
        ProductRepository::new(&self.pool)
            .get(id)
            .await?
            .map(|_| ())
            .ok_or(AdminError::NotFound)
    }

    /// Resolve a tagged reference to its target's display label.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Tags` if the lookup fails.
    pub async fn resolve(&self, target: ContentRef) -> Result<Option<ContentObject>, AdminError> {
        Ok(TagRepository::new(&self.pool)
            .resolve(&self.content_types, target)
            .await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use storehouse_core::{Email, Membership, Price};

    use super::*;
    use crate::db::test_support;
    use crate::db::{CollectionRepository, CustomerRepository};
    use crate::models::{
        Collection, CreateCollectionInput, CreateCustomerInput, CreateOrderInput,
        CreateProductInput, Customer, NewOrderItem, Product,
    };

    async fn collection(pool: &SqlitePool, title: &str) -> Collection {
        CollectionRepository::new(pool)
            .create(&CreateCollectionInput {
                title: title.to_owned(),
                featured_product_id: None,
            })
            .await
            .unwrap()
    }

    async fn product(
        pool: &SqlitePool,
        collection: &Collection,
        title: &str,
        price: &str,
        inventory: i32,
    ) -> Product {
        ProductRepository::new(pool)
            .create(&CreateProductInput {
                title: title.to_owned(),
                slug: None,
                description: String::new(),
                unit_price: price.parse().unwrap(),
                inventory,
                collection_id: collection.id,
                promotions: vec![],
            })
            .await
            .unwrap()
    }

    async fn customer(pool: &SqlitePool, first: &str, last: &str) -> Customer {
        CustomerRepository::new(pool)
            .create(&CreateCustomerInput {
                first_name: first.to_owned(),
                last_name: last.to_owned(),
                email: Email::parse(&format!("{first}.{last}@example.com").to_lowercase())
                    .unwrap(),
                phone: "555".to_owned(),
                birth_date: None,
                membership: Membership::Bronze,
            })
            .await
            .unwrap()
    }

    async fn catalog(pool: &SqlitePool) -> (Collection, Collection) {
        let games = collection(pool, "Games").await;
        let books = collection(pool, "Books").await;
        product(pool, &games, "Chess", "20.00", 9).await;
        product(pool, &games, "Go", "35.50", 10).await;
        product(pool, &games, "Backgammon", "12.25", 3).await;
        product(pool, &books, "Atlas", "40.00", 50).await;
        (games, books)
    }

    #[test]
    fn test_model_from_str() {
        assert_eq!("products".parse::<AdminModel>().unwrap(), AdminModel::Product);
        assert_eq!("Customer".parse::<AdminModel>().unwrap(), AdminModel::Customer);
        assert!(matches!(
            "tag".parse::<AdminModel>(),
            Err(AdminError::UnknownModel(_))
        ));
    }

    #[tokio::test]
    async fn test_product_changelist_defaults() {
        let pool = test_support::pool().await;
        catalog(&pool).await;
        let site = AdminSite::new(pool);

        let page = site
            .changelist(AdminModel::Product, &ListQuery::new())
            .await
            .unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.num_pages, 1);
        assert_eq!(
            page.column_values("title"),
            vec!["Atlas", "Backgammon", "Chess", "Go"]
        );
        assert_eq!(page.column_values("unit_price"), vec!["40.00", "12.25", "20.00", "35.50"]);
        assert_eq!(page.column_values("inventory_status"), vec!["OK", "Low", "Low", "OK"]);
        assert_eq!(
            page.column_values("collection_title"),
            vec!["Books", "Games", "Games", "Games"]
        );
    }

    #[tokio::test]
    async fn test_sort_by_computed_columns() {
        let pool = test_support::pool().await;
        catalog(&pool).await;
        let site = AdminSite::new(pool);

        let page = site
            .changelist(AdminModel::Product, &ListQuery::new().sort("inventory_status"))
            .await
            .unwrap();
        assert_eq!(page.column_values("inventory"), vec!["3", "9", "10", "50"]);

        let page = site
            .changelist(AdminModel::Product, &ListQuery::new().sort("-unit_price"))
            .await
            .unwrap();
        assert_eq!(page.column_values("title"), vec!["Atlas", "Go", "Chess", "Backgammon"]);

        assert!(matches!(
            site.changelist(AdminModel::Product, &ListQuery::new().sort("slug"))
                .await,
            Err(AdminError::UnknownSortKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_filters_and_search() {
        let pool = test_support::pool().await;
        let (games, _) = catalog(&pool).await;
        let site = AdminSite::new(pool);

        let page = site
            .changelist(
                AdminModel::Product,
                &ListQuery::new()
                    .filter("collection", &games.id.to_string())
                    .filter("inventory", "low"),
            )
            .await
            .unwrap();
        assert_eq!(page.column_values("title"), vec!["Backgammon", "Chess"]);

        let page = site
            .changelist(AdminModel::Product, &ListQuery::new().search("GAMMON"))
            .await
            .unwrap();
        assert_eq!(page.column_values("title"), vec!["Backgammon"]);

        let choices = site
            .filter_choices(AdminModel::Product, "collection")
            .await
            .unwrap();
        let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Books", "Games"]);
    }

    #[tokio::test]
    async fn test_pagination() {
        let pool = test_support::pool().await;
        let games = collection(&pool, "Games").await;
        for i in 0..12 {
            product(&pool, &games, &format!("Game {i:02}"), "1.00", i).await;
        }
        let site = AdminSite::new(pool);

        let first = site
            .changelist(AdminModel::Product, &ListQuery::new())
            .await
            .unwrap();
        assert_eq!(first.rows.len(), 10);
        assert_eq!(first.num_pages, 2);
        assert!(first.has_next());

        let second = site
            .changelist(AdminModel::Product, &ListQuery::new().page(2))
            .await
            .unwrap();
        assert_eq!(second.column_values("title"), vec!["Game 10", "Game 11"]);

        assert!(matches!(
            site.changelist(AdminModel::Product, &ListQuery::new().page(3))
                .await,
            Err(AdminError::InvalidPage { page: 3, num_pages: 2 })
        ));

        let site = site.with_list_per_page(5);
        let page = site
            .changelist(AdminModel::Product, &ListQuery::new())
            .await
            .unwrap();
        assert_eq!(page.num_pages, 3);
    }

    #[tokio::test]
    async fn test_customer_changelist() {
        let pool = test_support::pool().await;
        let ann = customer(&pool, "Ann", "Lee").await;
        customer(&pool, "Bob", "Annis").await;
        customer(&pool, "Carl", "Moss").await;
        OrderRepository::new(&pool)
            .create(&CreateOrderInput {
                customer_id: ann.id,
                payment_status: storehouse_core::PaymentStatus::Pending,
                items: vec![],
            })
            .await
            .unwrap();
        let site = AdminSite::new(pool);

        let page = site
            .changelist(AdminModel::Customer, &ListQuery::new())
            .await
            .unwrap();
        assert_eq!(page.column_values("first_name"), vec!["Ann", "Bob", "Carl"]);
        assert_eq!(page.column_values("orders_count"), vec!["1", "0", "0"]);

        // substring of either name
        let page = site
            .changelist(AdminModel::Customer, &ListQuery::new().search("ann"))
            .await
            .unwrap();
        assert_eq!(page.column_values("last_name"), vec!["Lee", "Annis"]);

        let page = site
            .changelist(AdminModel::Customer, &ListQuery::new().sort("-orders_count"))
            .await
            .unwrap();
        assert_eq!(page.rows[0].id, ann.id.as_i32());
    }

    #[tokio::test]
    async fn test_update_editable() {
        let pool = test_support::pool().await;
        let games = collection(&pool, "Games").await;
        let chess = product(&pool, &games, "Chess", "20.00", 9).await;
        let ann = customer(&pool, "Ann", "Lee").await;
        let site = AdminSite::new(pool);

        let row = site
            .update_editable(AdminModel::Product, chess.id.as_i32(), "inventory", "15")
            .await
            .unwrap();
        assert_eq!(row.cells[2], "15");
        assert_eq!(row.cells[3], "OK");

        let row = site
            .update_editable(AdminModel::Customer, ann.id.as_i32(), "membership", "G")
            .await
            .unwrap();
        assert_eq!(row.cells[2], "Gold");

        assert!(matches!(
            site.update_editable(AdminModel::Product, chess.id.as_i32(), "unit_price", "0.50")
                .await,
            Err(AdminError::InvalidValue { .. })
        ));
        assert!(matches!(
            site.update_editable(AdminModel::Product, chess.id.as_i32(), "title", "Draughts")
                .await,
            Err(AdminError::NotEditable { .. })
        ));
        assert!(matches!(
            site.update_editable(AdminModel::Product, chess.id.as_i32(), "slug", "x")
                .await,
            Err(AdminError::UnknownColumn { .. })
        ));
        assert!(matches!(
            site.update_editable(AdminModel::Product, 999, "inventory", "1")
                .await,
            Err(AdminError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_clear_inventory_action() {
        let pool = test_support::pool().await;
        catalog(&pool).await;
        let site = AdminSite::new(pool);

        let page = site
            .changelist(AdminModel::Product, &ListQuery::new())
            .await
            .unwrap();
        let ids = page.ids();

        let outcome = site
            .run_action(AdminModel::Product, "clear_inventory", &ids[..3])
            .await
            .unwrap();
        assert_eq!(outcome.affected, 3);
        assert_eq!(outcome.message, "3 products were successfully updated.");

        let page = site
            .changelist(AdminModel::Product, &ListQuery::new())
            .await
            .unwrap();
        assert_eq!(page.column_values("inventory"), vec!["0", "0", "0", "10"]);

        assert!(matches!(
            site.run_action(AdminModel::Product, "archive", &ids).await,
            Err(AdminError::UnknownAction { .. })
        ));
        assert!(matches!(
            site.run_action(AdminModel::Customer, "clear_inventory", &ids)
                .await,
            Err(AdminError::UnknownAction { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_selected_is_all_or_nothing() {
        let pool = test_support::pool().await;
        let games = collection(&pool, "Games").await;
        let empty = collection(&pool, "Empty").await;
        product(&pool, &games, "Chess", "20.00", 9).await;
        let site = AdminSite::new(pool);

        let result = site
            .run_action(
                AdminModel::Collection,
                "delete_selected",
                &[games.id.as_i32(), empty.id.as_i32()],
            )
            .await;
        assert!(matches!(
            result,
            Err(AdminError::Repository(RepositoryError::Protected(_)))
        ));
        let page = site
            .changelist(AdminModel::Collection, &ListQuery::new())
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let outcome = site
            .run_action(AdminModel::Collection, "delete_selected", &[empty.id.as_i32()])
            .await
            .unwrap();
        assert_eq!(outcome.message, "Successfully deleted 1 collections.");
    }

    #[tokio::test]
    async fn test_order_items_inline() {
        let pool = test_support::pool().await;
        let games = collection(&pool, "Games").await;
        let chess = product(&pool, &games, "Chess", "20.00", 9).await;
        let ann = customer(&pool, "Ann", "Lee").await;
        let order = OrderRepository::new(&pool)
            .create(&CreateOrderInput {
                customer_id: ann.id,
                payment_status: storehouse_core::PaymentStatus::Pending,
                items: vec![NewOrderItem {
                    product_id: chess.id,
                    quantity: 1,
                    unit_price: None,
                }],
            })
            .await
            .unwrap();
        let site = AdminSite::new(pool);

        let detail = site.order_change(order.id).await.unwrap();
        assert_eq!(detail.lines.len(), 1);
        let first = detail.lines[0].item.id;

        // the last item cannot be removed
        assert!(matches!(
            site.delete_order_item(order.id, first).await,
            Err(AdminError::InlineLimit(_))
        ));

        let edited = site
            .save_order_item(
                order.id,
                &OrderItemForm {
                    id: Some(first),
                    product_id: chess.id,
                    quantity: 4,
                    unit_price: Some(Price::from_cents(1800).unwrap()),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.quantity, 4);
        assert_eq!(edited.unit_price.to_string(), "18.00");

        for _ in 0..9 {
            site.save_order_item(
                order.id,
                &OrderItemForm {
                    id: None,
                    product_id: chess.id,
                    quantity: 1,
                    unit_price: None,
                },
            )
            .await
            .unwrap();
        }
        let eleventh = site
            .save_order_item(
                order.id,
                &OrderItemForm {
                    id: None,
                    product_id: chess.id,
                    quantity: 1,
                    unit_price: None,
                },
            )
            .await;
        assert!(matches!(eleventh, Err(AdminError::InlineLimit(_))));

        site.delete_order_item(order.id, first).await.unwrap();
        assert_eq!(site.order_change(order.id).await.unwrap().lines.len(), 9);
    }

    #[tokio::test]
    async fn test_product_tags_inline() {
        let pool = test_support::pool().await;
        let games = collection(&pool, "Games").await;
        let chess = product(&pool, &games, "Chess", "20.00", 9).await;
        let site = AdminSite::new(pool);

        let tags = site
            .set_product_tags(chess.id, &["classic".to_owned(), "strategy".to_owned()])
            .await
            .unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(site.product_tags(chess.id).await.unwrap().len(), 2);

        let resolved = site
            .resolve(tags[0].content)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.label, "Chess");

        assert!(matches!(
            site.product_tags(ProductId::new(999)).await,
            Err(AdminError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_tags_target_requires_tags_inline() {
        let site = AdminSite::new(test_support::pool().await);

        let target = site.tags_target(AdminModel::Product, 5).unwrap();
        assert_eq!(target, ContentRef::new(EntityKind::Product, 5));

        assert!(matches!(
            site.tags_target(AdminModel::Customer, 5),
            Err(AdminError::UnknownColumn { model: AdminModel::Customer, .. })
        ));
    }
}
