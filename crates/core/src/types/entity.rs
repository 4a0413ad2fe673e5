//! Entity kinds used as the discriminator of generic associations.
//!
//! A generic association row stores `(discriminator, object id)` instead of a
//! typed foreign key. The discriminator is the `app.model` string returned by
//! [`EntityKind::discriminator`]; it is part of the persisted format and must
//! not change once rows exist.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned for a discriminator or name no kind answers to.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown entity kind: {0}")]
pub struct UnknownEntityKind(pub String);

/// Every persisted entity type that can be the target of a generic association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Collection,
    Product,
    Promotion,
    Customer,
    Order,
    OrderItem,
    Address,
    Cart,
    CartItem,
}

impl EntityKind {
    /// All kinds, in schema order.
    pub const ALL: [Self; 9] = [
        Self::Collection,
        Self::Product,
        Self::Promotion,
        Self::Customer,
        Self::Order,
        Self::OrderItem,
        Self::Address,
        Self::Cart,
        Self::CartItem,
    ];

    /// Stored discriminator (`app_label.model`).
    #[must_use]
    pub const fn discriminator(self) -> &'static str {
        match self {
            Self::Collection => "store.collection",
            Self::Product => "store.product",
            Self::Promotion => "store.promotion",
            Self::Customer => "store.customer",
            Self::Order => "store.order",
            Self::OrderItem => "store.orderitem",
            Self::Address => "store.address",
            Self::Cart => "store.cart",
            Self::CartItem => "store.cartitem",
        }
    }

    /// Short model name (`product`, `orderitem`).
    #[must_use]
    pub fn model_name(self) -> &'static str {
        let d = self.discriminator();
        d.split_once('.').map_or(d, |(_, model)| model)
    }

    /// Look a kind up by its stored discriminator.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityKind` if no kind uses this discriminator.
    pub fn from_discriminator(value: &str) -> Result<Self, UnknownEntityKind> {
        Self::ALL
            .into_iter()
            .find(|k| k.discriminator() == value)
            .ok_or_else(|| UnknownEntityKind(value.to_string()))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.discriminator())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    /// Accepts the discriminator (`store.product`) or the model name
    /// (`product`, `Product`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.discriminator() == lower || k.model_name() == lower)
            .ok_or_else(|| UnknownEntityKind(s.to_string()))
    }
}
