//! Product collections.

use serde::{Deserialize, Serialize};

use storehouse_core::{CollectionId, ProductId};

use super::{MAX_TEXT_LENGTH, ValidationError, require_text};

/// A named group of products, optionally featuring one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Unique collection ID.
    pub id: CollectionId,
    /// Collection title.
    pub title: String,
    /// Product highlighted for this collection.
    ///
    /// Cleared automatically when that product is deleted.
    pub featured_product_id: Option<ProductId>,
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Input for creating a collection.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollectionInput {
    /// Collection title.
    pub title: String,
    /// Optional featured product.
    #[serde(default)]
    pub featured_product_id: Option<ProductId>,
}

impl CreateCollectionInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank or over-long title.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, MAX_TEXT_LENGTH)
    }
}

/// Input for updating a collection. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateCollectionInput {
    /// New title.
    pub title: Option<String>,
    /// New featured product; `Some(None)` clears it.
    pub featured_product_id: Option<Option<ProductId>>,
}

impl UpdateCollectionInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank or over-long title.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title, MAX_TEXT_LENGTH)?;
        }
        Ok(())
    }
}
