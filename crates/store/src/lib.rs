//! Storehouse Store - schema, repositories and admin layer.
//!
//! This crate owns the `store_*` tables of the Storehouse database:
//! collections, products, promotions, customers, orders, addresses and carts.
//! On top of the repositories sits an administrative customization layer that
//! describes how each model is listed, filtered, searched, edited in place and
//! acted on in bulk.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`models`] - Domain models and create/update inputs
//! - [`db`] - Repositories, connection pool and migrations
//! - [`content_types`] - Store entities registered as tagging targets
//! - [`admin`] - Changelists, list edits, bulk actions and inlines
//! - [`reports`] - Read-only reporting queries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod config;
pub mod content_types;
pub mod db;
pub mod models;
pub mod reports;

pub use admin::{AdminError, AdminModel, AdminSite, ListPage, ListQuery};
pub use config::{ConfigError, StoreConfig};
pub use db::{
    AddressRepository, CartRepository, CollectionRepository, CustomerRepository,
    OrderRepository, ProductRepository, PromotionRepository, RepositoryError, create_pool,
    migrate,
};
pub use reports::{PriceSummary, ReportRepository};
