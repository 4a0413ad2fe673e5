//! Orders and order items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storehouse_core::{CustomerId, OrderId, OrderItemId, PaymentStatus, Price, ProductId};

use super::{Customer, Product, ValidationError, check_quantity};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Set when the order is inserted.
    pub placed_at: DateTime<Utc>,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Customer who placed the order.
    pub customer_id: CustomerId,
}

/// One line of an order.
///
/// `unit_price` is captured when the line is created and is not linked to the
/// product's current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique order item ID.
    pub id: OrderItemId,
    /// Parent order.
    pub order_id: OrderId,
    /// Ordered product.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: i16,
    /// Price per unit at order time.
    pub unit_price: Price,
}

impl OrderItem {
    /// `quantity * unit_price`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.amount() * Decimal::from(self.quantity)
    }
}

/// An order item with its product loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The order item.
    pub item: OrderItem,
    /// The ordered product, as it is now.
    pub product: Product,
}

/// An order with its customer and all of its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    /// The order.
    pub order: Order,
    /// Who placed it.
    pub customer: Customer,
    /// Order lines, in insertion order.
    pub lines: Vec<OrderLine>,
}

impl OrderDetail {
    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|line| line.item.line_total()).sum()
    }
}

/// A line to add to an order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    /// Product to order.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: i16,
    /// Price override; the product's current price when omitted.
    #[serde(default)]
    pub unit_price: Option<Price>,
}

impl NewOrderItem {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a negative quantity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_quantity("quantity", self.quantity)
    }
}

/// Input for placing an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    /// Customer placing the order.
    pub customer_id: CustomerId,
    /// Initial payment state, pending when omitted.
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Order lines.
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

impl CreateOrderInput {
    /// Validate every line.
    ///
    /// # Errors
    ///
    /// Returns the first line's `ValidationError`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.items.iter().try_for_each(NewOrderItem::validate)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
            quantity: 3,
            unit_price: "2.50".parse().unwrap(),
        };
        assert_eq!(item.line_total(), Decimal::new(750, 2));
    }

    #[test]
    fn test_rejects_negative_quantity() {
        let input = CreateOrderInput {
            customer_id: CustomerId::new(1),
            payment_status: PaymentStatus::Pending,
            items: vec![NewOrderItem {
                product_id: ProductId::new(1),
                quantity: -2,
                unit_price: None,
            }],
        };
        assert_eq!(input.validate().unwrap_err().field, "quantity");
    }
}
