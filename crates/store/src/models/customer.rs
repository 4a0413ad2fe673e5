//! Customers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use storehouse_core::{CustomerId, Email, Membership};

use super::{MAX_TEXT_LENGTH, ValidationError, require_text};

/// A store customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address, unique across customers.
    pub email: Email,
    /// Phone number (free-form).
    pub phone: String,
    /// Date of birth, if known.
    pub birth_date: Option<NaiveDate>,
    /// Membership tier.
    pub membership: Membership,
}

impl Customer {
    /// "first last" display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl std::fmt::Display for Customer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Input for creating a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomerInput {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: Email,
    /// Phone number.
    pub phone: String,
    /// Date of birth.
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Membership tier, Bronze when omitted.
    #[serde(default)]
    pub membership: Membership,
}

impl CreateCustomerInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank or over-long name or phone.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("first_name", &self.first_name, MAX_TEXT_LENGTH)?;
        require_text("last_name", &self.last_name, MAX_TEXT_LENGTH)?;
        require_text("phone", &self.phone, MAX_TEXT_LENGTH)
    }
}

/// Input for updating a customer. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomerInput {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New email.
    pub email: Option<Email>,
    /// New phone.
    pub phone: Option<String>,
    /// New birth date; `Some(None)` clears it.
    pub birth_date: Option<Option<NaiveDate>>,
    /// New membership tier.
    pub membership: Option<Membership>,
}

impl UpdateCustomerInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.first_name {
            require_text("first_name", name, MAX_TEXT_LENGTH)?;
        }
        if let Some(name) = &self.last_name {
            require_text("last_name", name, MAX_TEXT_LENGTH)?;
        }
        if let Some(phone) = &self.phone {
            require_text("phone", phone, MAX_TEXT_LENGTH)?;
        }
        Ok(())
    }
}
