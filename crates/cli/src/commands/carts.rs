//! Saved cart commands.

use sqlx::PgPool;
use tracing::info;

use px_shop_core::{ProductId, UserId};
use px_shop_storefront::db::CartRepository;

use super::CliError;

/// Show the saved cart lines for a user.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn show(pool: &PgPool, user_id: i32) -> Result<(), CliError> {
    let items = CartRepository::new(pool)
        .items_for_user(UserId::new(user_id))
        .await?;

    if items.is_empty() {
        info!("User #{user_id} has no saved cart lines");
        return Ok(());
    }

    info!("Saved cart for user #{user_id} ({} lines)", items.len());
    for item in &items {
        info!(
            "  product #{:<3} x{:<3} added {}",
            item.product_id,
            item.quantity,
            item.added_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Set the quantity of a saved line; zero removes it.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub async fn set(pool: &PgPool, user_id: i32, product_id: i32, quantity: u32) -> Result<(), CliError> {
    CartRepository::new(pool)
        .set_quantity(UserId::new(user_id), ProductId::new(product_id), quantity)
        .await?;
    info!("User #{user_id}: product #{product_id} quantity set to {quantity}");
    Ok(())
}

/// Remove one product from a user's saved cart.
///
/// # Errors
///
/// Returns `CliError::NotFound` if the line does not exist.
pub async fn remove(pool: &PgPool, user_id: i32, product_id: i32) -> Result<(), CliError> {
    let removed = CartRepository::new(pool)
        .remove(UserId::new(user_id), ProductId::new(product_id))
        .await?;
    if !removed {
        return Err(CliError::NotFound(format!(
            "product {product_id} in cart of user {user_id}"
        )));
    }
    info!("User #{user_id}: product #{product_id} removed");
    Ok(())
}

/// Remove every saved line for a user.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub async fn clear(pool: &PgPool, user_id: i32) -> Result<(), CliError> {
    let removed = CartRepository::new(pool)
        .clear(UserId::new(user_id))
        .await?;
    info!("User #{user_id}: {removed} saved cart lines removed");
    Ok(())
}
