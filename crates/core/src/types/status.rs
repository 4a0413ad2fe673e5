//! Status enums for various entities.
//!
//! Membership and payment status are persisted as single-character codes
//! (`VARCHAR(1)`), matching the schema the admin panel was built against.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or user-supplied code is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} code: {value}")]
pub struct CodeError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Customer membership tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
pub enum Membership {
    #[default]
    #[serde(rename = "B")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "B"))]
    Bronze,
    #[serde(rename = "S")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "S"))]
    Silver,
    #[serde(rename = "G")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "G"))]
    Gold,
}

impl Membership {
    /// All tiers, in display order.
    pub const ALL: [Self; 3] = [Self::Bronze, Self::Silver, Self::Gold];

    /// Single-character storage code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Bronze => "B",
            Self::Silver => "S",
            Self::Gold => "G",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
        }
    }
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Membership {
    type Err = CodeError;

    /// Accepts either the storage code (`G`) or the label (`gold`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.code() == s || m.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodeError {
                kind: "membership",
                value: s.to_string(),
            })
    }
}

/// Order payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
pub enum PaymentStatus {
    #[default]
    #[serde(rename = "P")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "P"))]
    Pending,
    #[serde(rename = "C")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "C"))]
    Complete,
    #[serde(rename = "F")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "F"))]
    Failed,
}

impl PaymentStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Complete, Self::Failed];

    /// Single-character storage code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Complete => "C",
            Self::Failed => "F",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = CodeError;

    /// Accepts either the storage code (`C`) or the label (`complete`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.code() == s || p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodeError {
                kind: "payment status",
                value: s.to_string(),
            })
    }
}

/// Coarse stock label shown next to a product's inventory count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InventoryStatus {
    Low,
    #[serde(rename = "OK")]
    Ok,
}

impl InventoryStatus {
    /// Inventory counts strictly below this value are `Low`.
    pub const LOW_THRESHOLD: i32 = 10;

    /// Classify an inventory count.
    ///
    /// ```
    /// use storehouse_core::InventoryStatus;
    ///
    /// assert_eq!(InventoryStatus::classify(9), InventoryStatus::Low);
    /// assert_eq!(InventoryStatus::classify(10), InventoryStatus::Ok);
    /// ```
    #[must_use]
    pub const fn classify(inventory: i32) -> Self {
        if inventory < Self::LOW_THRESHOLD {
            Self::Low
        } else {
            Self::Ok
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Ok => "OK",
        }
    }
}

impl std::fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
