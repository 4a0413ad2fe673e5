//! Storehouse Tags - generic tagging of any stored entity.
//!
//! A [`Tag`] is attached to a target through a [`TaggedItem`] row that stores
//! the target's [`EntityKind`] discriminator and its id. The association is
//! resolved by that pair, never by a typed foreign key, so this crate does not
//! depend on the crate that defines the tagged entities.
//!
//! # Modules
//!
//! - [`models`] - `Tag`, `TaggedItem`, `ContentRef`, `ContentObject`
//! - [`taggable`] - `Taggable` trait implemented by taggable entities
//! - [`content_type`] - registry mapping entity kinds to their table
//! - [`db`] - `TagRepository` and migrations
//!
//! [`EntityKind`]: storehouse_core::EntityKind

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod content_type;
pub mod db;
pub mod error;
pub mod models;
pub mod taggable;

pub use content_type::{ContentTypeInfo, ContentTypeRegistry};
pub use db::{TagRepository, migrate};
pub use error::TagError;
pub use models::{ContentObject, ContentRef, Tag, TaggedItem};
pub use taggable::Taggable;
