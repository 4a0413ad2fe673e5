//! Type-safe monetary amounts using decimal arithmetic.
//!
//! Every monetary column in the schema is `DECIMAL(6, 2)`: at most six
//! digits, two of them after the decimal point. [`Price`] enforces the same
//! bounds in memory so a value that fits the type always fits the column.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price is not a valid decimal: {0}")]
    Malformed(String),
    /// More than two digits after the decimal point.
    #[error("price must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum allowed decimal places.
        max: u32,
    },
    /// More than six digits in total.
    #[error("price must have at most {max} digits")]
    TooLarge {
        /// Maximum allowed total digits.
        max: u32,
    },
}

/// A monetary amount with two decimal places.
///
/// ## Examples
///
/// ```
/// use storehouse_core::Price;
///
/// let price: Price = "19.9".parse().unwrap();
/// assert_eq!(price.to_string(), "19.90");
///
/// assert!("10000.00".parse::<Price>().is_err()); // seven digits
/// assert!("1.999".parse::<Price>().is_err());    // three decimal places
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Total number of digits allowed.
    pub const MAX_DIGITS: u32 = 6;
    /// Digits allowed after the decimal point.
    pub const DECIMAL_PLACES: u32 = 2;

    /// Build a price from a decimal, checking the column bounds.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooPrecise` if the value needs more than two
    /// decimal places, `PriceError::TooLarge` if it needs more than six digits.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let normalized = amount.normalize();
        if normalized.scale() > Self::DECIMAL_PLACES {
            return Err(PriceError::TooPrecise {
                max: Self::DECIMAL_PLACES,
            });
        }

        let limit = Decimal::from(10_i64.pow(Self::MAX_DIGITS - Self::DECIMAL_PLACES));
        if normalized.abs() >= limit {
            return Err(PriceError::TooLarge {
                max: Self::MAX_DIGITS,
            });
        }

        let mut value = normalized;
        value.rescale(Self::DECIMAL_PLACES);
        Ok(Self(value))
    }

    /// Build a price from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` if the amount exceeds `9999.99`.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, Self::DECIMAL_PLACES))
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|e| PriceError::Malformed(e.to_string()))?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rescales_to_two_places() {
        let price = Price::new(Decimal::new(5, 0)).unwrap();
        assert_eq!(price.to_string(), "5.00");
        assert_eq!(price.amount().scale(), 2);
    }

    #[test]
    fn test_trailing_zeros_are_not_precision() {
        assert!("12.3400".parse::<Price>().is_ok());
    }

    #[test]
    fn test_too_precise() {
        assert_eq!(
            "1.005".parse::<Price>(),
            Err(PriceError::TooPrecise { max: 2 })
        );
    }

    #[test]
    fn test_upper_bound() {
        assert!("9999.99".parse::<Price>().is_ok());
        assert_eq!(
            "10000".parse::<Price>(),
            Err(PriceError::TooLarge { max: 6 })
        );
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            "abc".parse::<Price>(),
            Err(PriceError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(1999).unwrap().to_string(), "19.99");
    }

    #[test]
    fn test_ordering() {
        let low: Price = "1.50".parse().unwrap();
        let high: Price = "10".parse().unwrap();
        assert!(low < high);
    }

    #[test]
    fn test_serde_uses_string() {
        let price: Price = "4.5".parse().unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"4.50\"");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }
}
