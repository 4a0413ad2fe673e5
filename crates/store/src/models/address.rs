//! Customer addresses.

use serde::{Deserialize, Serialize};

use storehouse_core::{AddressId, CustomerId};

use super::{MAX_TEXT_LENGTH, ValidationError, check_length, require_text};

/// Maximum length of a zip code.
pub const MAX_ZIP_LENGTH: usize = 10;

/// A postal address. Deleted together with its customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Unique address ID.
    pub id: AddressId,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// Postal code, if any.
    pub zip_code: Option<String>,
    /// Owning customer.
    pub customer_id: CustomerId,
}

/// Input for creating an address.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAddressInput {
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// Postal code.
    #[serde(default)]
    pub zip_code: Option<String>,
    /// Owning customer.
    pub customer_id: CustomerId,
}

impl CreateAddressInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank street or city, or a zip code
    /// longer than ten characters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("street", &self.street, MAX_TEXT_LENGTH)?;
        require_text("city", &self.city, MAX_TEXT_LENGTH)?;
        if let Some(zip) = &self.zip_code {
            check_length("zip_code", zip, MAX_ZIP_LENGTH)?;
        }
        Ok(())
    }
}
