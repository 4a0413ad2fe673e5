//! Products and their catalog metadata.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storehouse_core::{CollectionId, InventoryStatus, Price, ProductId, PromotionId};

use super::{Collection, MAX_TEXT_LENGTH, ValidationError, check_length, require_text};

/// Maximum length of a product slug.
pub const MAX_SLUG_LENGTH: usize = 50;

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Current selling price.
    pub unit_price: Price,
    /// Units in stock.
    pub inventory: i32,
    /// Set on every save.
    pub last_update: DateTime<Utc>,
    /// Owning collection.
    pub collection_id: CollectionId,
}

impl Product {
    /// Stock label for this product.
    #[must_use]
    pub const fn inventory_status(&self) -> InventoryStatus {
        InventoryStatus::classify(self.inventory)
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// A product loaded together with its collection in one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductWithCollection {
    /// The product.
    pub product: Product,
    /// Its collection.
    pub collection: Collection,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    /// Product title.
    pub title: String,
    /// URL slug; derived from the title when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Selling price, at least 1.
    pub unit_price: Price,
    /// Units in stock.
    pub inventory: i32,
    /// Owning collection.
    pub collection_id: CollectionId,
    /// Promotions to attach.
    #[serde(default)]
    pub promotions: Vec<PromotionId>,
}

impl CreateProductInput {
    /// The slug to store: the explicit one, or one derived from the title.
    #[must_use]
    pub fn effective_slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.title))
    }

    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank title, an invalid slug or a unit
    /// price below 1.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, MAX_TEXT_LENGTH)?;
        validate_slug(&self.effective_slug())?;
        validate_unit_price(self.unit_price)
    }
}

/// Input for updating a product. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    /// New title.
    pub title: Option<String>,
    /// New slug.
    pub slug: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New price.
    pub unit_price: Option<Price>,
    /// New stock count.
    pub inventory: Option<i32>,
    /// Move to another collection.
    pub collection_id: Option<CollectionId>,
}

impl UpdateProductInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title, MAX_TEXT_LENGTH)?;
        }
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        if let Some(price) = self.unit_price {
            validate_unit_price(price)?;
        }
        Ok(())
    }
}

/// Unit prices must be at least 1.
///
/// # Errors
///
/// Returns `ValidationError` if the price is below 1.
pub fn validate_unit_price(price: Price) -> Result<(), ValidationError> {
    if price.amount() < Decimal::ONE {
        return Err(ValidationError::new(
            "unit_price",
            "ensure this value is greater than or equal to 1",
        ));
    }
    Ok(())
}

/// Slugs hold letters, digits, underscores and hyphens only.
///
/// # Errors
///
/// Returns `ValidationError` for an empty, over-long or malformed slug.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::new("slug", "this field cannot be blank"));
    }
    check_length("slug", slug, MAX_SLUG_LENGTH)?;
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::new(
            "slug",
            "enter a valid slug consisting of letters, numbers, underscores or hyphens",
        ));
    }
    Ok(())
}

/// Derive a slug from a title: lowercase ASCII words joined by hyphens.
///
/// ```
/// use storehouse_store::models::slugify;
///
/// assert_eq!(slugify("Bread - Ciabatta, Mini"), "bread-ciabatta-mini");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    slug.chars().take(MAX_SLUG_LENGTH).collect::<String>().trim_end_matches('-').to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(title: &str, price: &str) -> CreateProductInput {
        CreateProductInput {
            title: title.to_owned(),
            slug: None,
            description: String::new(),
            unit_price: price.parse().unwrap(),
            inventory: 5,
            collection_id: CollectionId::new(1),
            promotions: vec![],
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Coffee Beans"), "coffee-beans");
        assert_eq!(slugify("  Tea -- Green!  "), "tea-green");
        assert_eq!(slugify("Crème brûlée"), "crme-brle");
        assert_eq!(slugify(&"a ".repeat(40)).len(), 49);
    }

    #[test]
    fn test_unit_price_minimum() {
        assert!(input("Mug", "1.00").validate().is_ok());
        let err = input("Mug", "0.99").validate().unwrap_err();
        assert_eq!(err.field, "unit_price");
    }

    #[test]
    fn test_slug_validation() {
        let mut product = input("Mug", "4.50");
        product.slug = Some("bad slug".to_owned());
        assert_eq!(product.validate().unwrap_err().field, "slug");

        let untitled = input("!!!", "4.50");
        assert_eq!(untitled.validate().unwrap_err().field, "slug");
    }

    #[test]
    fn test_inventory_status() {
        let product = Product {
            id: ProductId::new(1),
            title: "Mug".to_owned(),
            slug: "mug".to_owned(),
            description: String::new(),
            unit_price: "4.50".parse().unwrap(),
            inventory: 9,
            last_update: Utc::now(),
            collection_id: CollectionId::new(1),
        };
        assert_eq!(product.inventory_status(), InventoryStatus::Low);
    }
}
