//! Core types for Storehouse.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod entity;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use entity::{EntityKind, UnknownEntityKind};
pub use id::*;
pub use price::{Price, PriceError};
pub use status::*;
