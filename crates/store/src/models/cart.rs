//! Shopping carts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storehouse_core::{CartId, CartItemId, ProductId};

use super::Product;

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Set when the cart is inserted.
    pub created_at: DateTime<Utc>,
}

/// A product in a cart. Deleted together with the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Unique cart item ID.
    pub id: CartItemId,
    /// Owning cart.
    pub cart_id: CartId,
    /// Product in the cart.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: i16,
}

/// A cart item with its product loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The cart item.
    pub item: CartItem,
    /// The product.
    pub product: Product,
}

/// A cart with all of its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDetail {
    /// The cart.
    pub cart: Cart,
    /// Cart lines, in insertion order.
    pub lines: Vec<CartLine>,
}

impl CartDetail {
    /// Cart value at current product prices.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| line.product.unit_price.amount() * Decimal::from(line.item.quantity))
            .sum()
    }
}
