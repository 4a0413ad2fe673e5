//! Errors raised by tag operations.

use thiserror::Error;

/// Errors that can occur during tag repository operations.
#[derive(Debug, Error)]
pub enum TagError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying the tags migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be converted (e.g. unknown discriminator).
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested tag was not found.
    #[error("not found")]
    NotFound,

    /// Input rejected before reaching the database.
    #[error("invalid input: {0}")]
    Invalid(String),
}
