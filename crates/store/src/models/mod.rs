//! Domain models for the store schema.
//!
//! These are the validated, typed counterparts of the `store_*` tables. Row
//! structs used for decoding live next to the queries in [`crate::db`].

pub mod address;
pub mod cart;
pub mod collection;
pub mod customer;
pub mod order;
pub mod product;
pub mod promotion;

pub use address::{Address, CreateAddressInput};
pub use cart::{Cart, CartDetail, CartItem, CartLine};
pub use collection::{Collection, CreateCollectionInput, UpdateCollectionInput};
pub use customer::{CreateCustomerInput, Customer, UpdateCustomerInput};
pub use order::{CreateOrderInput, NewOrderItem, Order, OrderDetail, OrderItem, OrderLine};
pub use product::{
    CreateProductInput, Product, ProductWithCollection, UpdateProductInput, slugify,
};
pub use promotion::{CreatePromotionInput, Promotion};

use thiserror::Error;

/// Maximum length of the `VARCHAR(255)` text columns.
pub const MAX_TEXT_LENGTH: usize = 255;

/// A field value rejected before reaching the database.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a required, length-limited text field.
pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "this field cannot be blank"));
    }
    check_length(field, value, max)
}

pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("ensure this value has at most {max} characters"),
        ));
    }
    Ok(())
}

/// Check a `PositiveSmallIntegerField`-style quantity.
pub(crate) fn check_quantity(field: &'static str, value: i16) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(
            field,
            "ensure this value is greater than or equal to 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("title", "Games", 255).is_ok());
        assert_eq!(
            require_text("title", "  ", 255).unwrap_err().field,
            "title"
        );
        assert!(require_text("zip", "12345678901", 10).is_err());
    }

    #[test]
    fn test_check_quantity() {
        assert!(check_quantity("quantity", 0).is_ok());
        assert!(check_quantity("quantity", -1).is_err());
    }
}
