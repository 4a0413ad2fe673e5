//! Seed the store from a YAML fixture file.
//!
//! Fixtures refer to each other by natural keys rather than ids: products name
//! their collection and promotions by title and description, orders name their
//! customer by email and their products by title.
//!
//! ```yaml
//! collections:
//!   - title: Games
//! products:
//!   - title: Chess
//!     unit_price: "20.00"
//!     inventory: 9
//!     collection: Games
//! customers:
//!   - first_name: Ann
//!     last_name: Lee
//!     email: ann@example.com
//!     phone: "555-0100"
//!     membership: G
//! orders:
//!   - customer: ann@example.com
//!     items:
//!       - product: Chess
//!         quantity: 2
//! tags:
//!   - product: Chess
//!     labels: [classic, strategy]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use storehouse_core::{
    CollectionId, Email, EntityKind, PaymentStatus, Price, ProductId, PromotionId,
};
use storehouse_store::models::{
    CreateAddressInput, CreateCollectionInput, CreateCustomerInput, CreateOrderInput,
    CreateProductInput, CreatePromotionInput, NewOrderItem,
};
use storehouse_store::{
    AddressRepository, CollectionRepository, CustomerRepository, OrderRepository,
    ProductRepository, PromotionRepository, RepositoryError,
};
use storehouse_tags::{ContentRef, TagError, TagRepository};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Fixture file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Fixture file is not valid YAML for the fixture format.
    #[error("Invalid fixture file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A fixture names an object that is not defined.
    #[error("Unknown {kind} '{name}' referenced in fixtures")]
    UnknownReference { kind: &'static str, name: String },

    /// Repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Tagging error.
    #[error(transparent)]
    Tags(#[from] TagError),
}

/// Contents of a fixture file.
#[derive(Debug, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub collections: Vec<CollectionFixture>,
    #[serde(default)]
    pub promotions: Vec<CreatePromotionInput>,
    #[serde(default)]
    pub products: Vec<ProductFixture>,
    #[serde(default)]
    pub customers: Vec<CustomerFixture>,
    #[serde(default)]
    pub orders: Vec<OrderFixture>,
    #[serde(default)]
    pub tags: Vec<TagFixture>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionFixture {
    pub title: String,
    /// Title of the featured product.
    #[serde(default)]
    pub featured_product: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub unit_price: Price,
    pub inventory: i32,
    /// Collection title.
    pub collection: String,
    /// Promotion descriptions.
    #[serde(default)]
    pub promotions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerFixture {
    #[serde(flatten)]
    pub customer: CreateCustomerInput,
    #[serde(default)]
    pub addresses: Vec<AddressFixture>,
}

#[derive(Debug, Deserialize)]
pub struct AddressFixture {
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub zip_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Customer email.
    pub customer: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub items: Vec<OrderItemFixture>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemFixture {
    /// Product title.
    pub product: String,
    pub quantity: i16,
    #[serde(default)]
    pub unit_price: Option<Price>,
}

#[derive(Debug, Deserialize)]
pub struct TagFixture {
    /// Product title.
    pub product: String,
    pub labels: Vec<String>,
}

/// Number of rows created per table.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SeedSummary {
    pub collections: usize,
    pub promotions: usize,
    pub products: usize,
    pub customers: usize,
    pub addresses: usize,
    pub orders: usize,
    pub tagged: usize,
}

fn lookup<T: Copy>(
    map: &HashMap<String, T>,
    kind: &'static str,
    name: &str,
) -> Result<T, SeedError> {
    map.get(name)
        .copied()
        .ok_or_else(|| SeedError::UnknownReference {
            kind,
            name: name.to_owned(),
        })
}

/// Read a fixture file and seed the store with it.
///
/// # Errors
///
/// Returns `SeedError::Io` if the file cannot be read and `SeedError::Yaml`
/// if it does not parse; see [`seed`] for the rest.
pub async fn from_file(pool: &SqlitePool, file_path: &str) -> Result<SeedSummary, SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading fixtures from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let fixtures: Fixtures = serde_yaml::from_str(&content)?;

    seed(pool, &fixtures).await
}

/// Insert fixtures in dependency order.
///
/// # Errors
///
/// Returns `SeedError::UnknownReference` for a dangling natural key and
/// `SeedError::Repository` if a row is rejected (e.g. a duplicate email).
/// Rows inserted before the failure are kept.
pub async fn seed(pool: &SqlitePool, fixtures: &Fixtures) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    let collections_repo = CollectionRepository::new(pool);
    let mut collections: HashMap<String, CollectionId> = HashMap::new();
    for fixture in &fixtures.collections {
        let collection = collections_repo
            .create(&CreateCollectionInput {
                title: fixture.title.clone(),
                featured_product_id: None,
            })
            .await?;
        collections.insert(collection.title.clone(), collection.id);
        summary.collections += 1;
    }

    let promotions_repo = PromotionRepository::new(pool);
    let mut promotions: HashMap<String, PromotionId> = HashMap::new();
    for input in &fixtures.promotions {
        let promotion = promotions_repo.create(input).await?;
        promotions.insert(promotion.description.clone(), promotion.id);
        summary.promotions += 1;
    }

    let products_repo = ProductRepository::new(pool);
    let mut products: HashMap<String, ProductId> = HashMap::new();
    for fixture in &fixtures.products {
        let promotion_ids = fixture
            .promotions
            .iter()
            .map(|p| lookup(&promotions, "promotion", p))
            .collect::<Result<Vec<_>, _>>()?;
        let product = products_repo
            .create(&CreateProductInput {
                title: fixture.title.clone(),
                slug: fixture.slug.clone(),
                description: fixture.description.clone(),
                unit_price: fixture.unit_price,
                inventory: fixture.inventory,
                collection_id: lookup(&collections, "collection", &fixture.collection)?,
                promotions: promotion_ids,
            })
            .await?;
        products.insert(product.title.clone(), product.id);
        summary.products += 1;
    }

    for fixture in &fixtures.collections {
        if let Some(featured) = &fixture.featured_product {
            collections_repo
                .set_featured_product(
                    lookup(&collections, "collection", &fixture.title)?,
                    Some(lookup(&products, "product", featured)?),
                )
                .await?;
        }
    }

    let customers_repo = CustomerRepository::new(pool);
    let addresses_repo = AddressRepository::new(pool);
    let mut customers = HashMap::new();
    for fixture in &fixtures.customers {
        let customer = customers_repo.create(&fixture.customer).await?;
        for address in &fixture.addresses {
            addresses_repo
                .create(&CreateAddressInput {
                    street: address.street.clone(),
                    city: address.city.clone(),
                    zip_code: address.zip_code.clone(),
                    customer_id: customer.id,
                })
                .await?;
            summary.addresses += 1;
        }
        customers.insert(customer.email.as_str().to_owned(), customer.id);
        summary.customers += 1;
    }

    let orders_repo = OrderRepository::new(pool);
    for fixture in &fixtures.orders {
        let email = Email::parse(&fixture.customer).map_err(|_| SeedError::UnknownReference {
            kind: "customer",
            name: fixture.customer.clone(),
        })?;
        let items = fixture
            .items
            .iter()
            .map(|item| {
                Ok(NewOrderItem {
                    product_id: lookup(&products, "product", &item.product)?,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
            })
            .collect::<Result<Vec<_>, SeedError>>()?;
        orders_repo
            .create(&CreateOrderInput {
                customer_id: lookup(&customers, "customer", email.as_str())?,
                payment_status: fixture.payment_status,
                items,
            })
            .await?;
        summary.orders += 1;
    }

    let tags = TagRepository::new(pool);
    for fixture in &fixtures.tags {
        let product_id = lookup(&products, "product", &fixture.product)?;
        tags.replace_tags(
            ContentRef::new(EntityKind::Product, product_id.as_i32()),
            &fixture.labels,
        )
        .await?;
        summary.tagged += 1;
    }

    info!(
        collections = summary.collections,
        products = summary.products,
        customers = summary.customers,
        orders = summary.orders,
        "Seeding complete!"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehouse_store::{StoreConfig, create_pool, migrate};

    use super::*;

    async fn pool() -> SqlitePool {
        let pool = create_pool(&StoreConfig::in_memory()).await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_seed_bundled_catalog() {
        let pool = pool().await;
        let fixtures: Fixtures =
            serde_yaml::from_str(include_str!("../../fixtures/catalog.yaml")).unwrap();

        let summary = seed(&pool, &fixtures).await.unwrap();
        assert_eq!(summary.collections, fixtures.collections.len());
        assert_eq!(summary.products, fixtures.products.len());
        assert_eq!(summary.orders, fixtures.orders.len());
        assert!(summary.tagged > 0);
    }

    #[tokio::test]
    async fn test_unknown_reference() {
        let pool = pool().await;
        let fixtures: Fixtures = serde_yaml::from_str(
            r#"
            collections:
              - title: Games
            products:
              - title: Chess
                unit_price: "20.00"
                inventory: 9
                collection: Toys
            "#,
        )
        .unwrap();

        let result = seed(&pool, &fixtures).await;
        assert!(matches!(
            result,
            Err(SeedError::UnknownReference { kind: "collection", .. })
        ));
    }
}
