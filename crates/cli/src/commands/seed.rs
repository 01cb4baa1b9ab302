//! Seed the storefront database.
//!
//! Product records are upserted from a catalog JSON file (the bundled
//! catalog by default), so re-running the command is safe.

use sqlx::PgPool;
use tracing::info;

use px_shop_core::{Catalog, UserId};
use px_shop_storefront::db::{OrderRepository, ProductRepository, UserRepository};
use px_shop_storefront::models::NewOrderItem;

use super::CliError;

/// Upsert every product in the catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a statement fails.
pub async fn products(pool: &PgPool, file: Option<&str>) -> Result<(), CliError> {
    let catalog = match file {
        Some(path) => {
            info!(path, "Loading catalog from file");
            let json = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| CliError::Io(path.to_string(), e))?;
            Catalog::from_json(&json)?
        }
        None => Catalog::bundled()?,
    };

    let repo = ProductRepository::new(pool);
    for product in catalog.products() {
        repo.upsert(product).await?;
    }

    info!("Seeding complete!");
    info!("  Products upserted: {}", catalog.products().len());
    Ok(())
}

/// Create a pending sample order for `user_id` from the first `lines`
/// catalog products.
///
/// # Errors
///
/// Returns `CliError::NotFound` if the user does not exist.
pub async fn orders(pool: &PgPool, user_id: i32, lines: usize) -> Result<(), CliError> {
    if lines == 0 {
        return Err(CliError::InvalidArgument(
            "an order needs at least one line".to_string(),
        ));
    }

    let user_id = UserId::new(user_id);
    let user = UserRepository::new(pool)
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("user {user_id}")))?;

    let catalog = Catalog::bundled()?;
    let items: Vec<NewOrderItem> = catalog
        .products()
        .iter()
        .take(lines)
        .zip(1u32..)
        .map(|(product, quantity)| NewOrderItem {
            product_id: product.id,
            quantity,
            price: product.price,
        })
        .collect();

    let order = OrderRepository::new(pool).create(user.id, &items).await?;

    info!(
        "Created order #{} for {} ({} items, total {})",
        order.id,
        user.email,
        order.item_count(),
        order.total
    );
    Ok(())
}
