//! Promotions attached to products.

use serde::{Deserialize, Serialize};

use storehouse_core::PromotionId;

use super::{MAX_TEXT_LENGTH, ValidationError, require_text};

/// A discount that can apply to many products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    /// Unique promotion ID.
    pub id: PromotionId,
    /// Promotion description.
    pub description: String,
    /// Discount amount (stored as a float).
    pub discount: f64,
}

/// Input for creating a promotion.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePromotionInput {
    /// Promotion description.
    pub description: String,
    /// Discount amount.
    pub discount: f64,
}

impl CreatePromotionInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank description or a non-finite
    /// discount.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("description", &self.description, MAX_TEXT_LENGTH)?;
        if !self.discount.is_finite() {
            return Err(ValidationError::new("discount", "enter a number"));
        }
        Ok(())
    }
}
