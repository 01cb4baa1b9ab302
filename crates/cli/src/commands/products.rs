//! Product record commands.

use sqlx::PgPool;
use tracing::info;

use px_shop_core::ProductId;
use px_shop_storefront::db::ProductRepository;

use super::CliError;

/// List product records, optionally for one category.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list(pool: &PgPool, category: Option<&str>) -> Result<(), CliError> {
    let repo = ProductRepository::new(pool);
    let products = match category {
        Some(category) => repo.list_by_category(category).await?,
        None => repo.list().await?,
    };

    info!("Products ({})", products.len());
    for product in &products {
        info!(
            "  #{:<3} {:<36} {:>10}  stock {:>4}  {}",
            product.id, product.name, product.price, product.stock, product.category
        );
    }
    Ok(())
}

/// Set the stock level of a product.
///
/// # Errors
///
/// Returns `CliError::Repository` if the product does not exist.
pub async fn set_stock(pool: &PgPool, id: i32, stock: u32) -> Result<(), CliError> {
    ProductRepository::new(pool)
        .update_stock(ProductId::new(id), stock)
        .await?;
    info!("Product #{id} stock set to {stock}");
    Ok(())
}

/// Delete a product record.
///
/// # Errors
///
/// Returns `CliError::NotFound` if no product has this id.
pub async fn delete(pool: &PgPool, id: i32) -> Result<(), CliError> {
    if !ProductRepository::new(pool).delete(ProductId::new(id)).await? {
        return Err(CliError::NotFound(format!("product {id}")));
    }
    info!("Product #{id} deleted");
    Ok(())
}
