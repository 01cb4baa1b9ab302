//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! px-cli migrate
//! ```
//!
//! Runs the storefront migrations in `crates/storefront/migrations/`, then
//! creates the `tower_sessions` table used by the session store.

use sqlx::PgPool;

use px_shop_storefront::middleware::postgres_store;

use super::CliError;

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `CliError` if a migration fails.
pub async fn run(pool: &PgPool) -> Result<(), CliError> {
    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(pool).await?;

    tracing::info!("Running session store migration...");
    postgres_store(pool)
        .migrate()
        .await
        .map_err(|e| CliError::SessionStore(e.to_string()))?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
