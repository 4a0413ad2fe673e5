//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! storehouse migrate
//! ```
//!
//! Applies the tags migrations (`crates/tags/migrations/`) and then the store
//! migrations (`crates/store/migrations/`). Already-applied migrations are
//! skipped, so the command can be run repeatedly.

use sqlx::SqlitePool;

use storehouse_store::RepositoryError;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails to apply.
pub async fn run(pool: &SqlitePool) -> Result<(), RepositoryError> {
    tracing::info!("Running migrations...");
    storehouse_store::migrate(pool).await?;
    tracing::info!("Migrations complete!");
    Ok(())
}
