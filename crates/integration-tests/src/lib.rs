//! Integration tests for Storehouse.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storehouse-integration-tests
//! ```
//!
//! Every test gets its own migrated `sqlite::memory:` database through
//! [`TestContext`], so tests need no external services and can run in
//! parallel.
//!
//! # Test Categories
//!
//! - `schema_integrity` - Referential actions and constraints
//! - `tagging` - Generic tag associations
//! - `admin_changelists` - Changelists, list edits, bulk actions, reports

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use sqlx::SqlitePool;

use storehouse_core::{CollectionId, CustomerId, Email, Membership, PaymentStatus, ProductId};
use storehouse_store::models::{
    Collection, CreateCollectionInput, CreateCustomerInput, CreateOrderInput, CreateProductInput,
    Customer, NewOrderItem, Order, Product,
};
use storehouse_store::{
    AdminSite, CollectionRepository, CustomerRepository, OrderRepository, ProductRepository,
    StoreConfig, create_pool, migrate,
};

/// A fresh, migrated in-memory store with an admin site over it.
pub struct TestContext {
    pub pool: SqlitePool,
    pub site: AdminSite,
}

impl TestContext {
    /// Create a new context.
    pub async fn new() -> Self {
        let pool = create_pool(&StoreConfig::in_memory())
            .await
            .expect("Failed to open in-memory database");
        migrate(&pool).await.expect("Failed to run migrations");
        let site = AdminSite::new(pool.clone());
        Self { pool, site }
    }

    /// Insert a collection.
    pub async fn collection(&self, title: &str) -> Collection {
        CollectionRepository::new(&self.pool)
            .create(&CreateCollectionInput {
                title: title.to_owned(),
                featured_product_id: None,
            })
            .await
            .expect("Failed to create collection")
    }

    /// Insert a product.
    pub async fn product(
        &self,
        collection_id: CollectionId,
        title: &str,
        unit_price: &str,
        inventory: i32,
    ) -> Product {
        ProductRepository::new(&self.pool)
            .create(&CreateProductInput {
                title: title.to_owned(),
                slug: None,
                description: String::new(),
                unit_price: unit_price.parse().expect("Invalid test price"),
                inventory,
                collection_id,
                promotions: vec![],
            })
            .await
            .expect("Failed to create product")
    }

    /// Insert a customer with an email derived from their name.
    pub async fn customer(&self, first_name: &str, last_name: &str) -> Customer {
        let email = format!("{first_name}.{last_name}@example.com").to_lowercase();
        CustomerRepository::new(&self.pool)
            .create(&CreateCustomerInput {
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                email: Email::parse(&email).expect("Invalid test email"),
                phone: "555-0100".to_owned(),
                birth_date: None,
                membership: Membership::Bronze,
            })
            .await
            .expect("Failed to create customer")
    }

    /// Place an order for `(product, quantity)` lines at current prices.
    pub async fn order(&self, customer_id: CustomerId, lines: &[(ProductId, i16)]) -> Order {
        OrderRepository::new(&self.pool)
            .create(&CreateOrderInput {
                customer_id,
                payment_status: PaymentStatus::Pending,
                items: lines
                    .iter()
                    .map(|&(product_id, quantity)| NewOrderItem {
                        product_id,
                        quantity,
                        unit_price: None,
                    })
                    .collect(),
            })
            .await
            .expect("Failed to create order")
    }

    /// Number of rows in a table.
    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count rows")
    }
}
