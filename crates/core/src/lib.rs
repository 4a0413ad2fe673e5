//! Storehouse Core - Shared types library.
//!
//! This crate provides common types used across all Storehouse components:
//! - `tags` - Generic tagging of any stored entity
//! - `store` - Schema, repositories and the admin customization layer
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access.
//! The optional `sqlite` feature adds `sqlx` encodings for the status enums.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, statuses
//!   and entity kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
