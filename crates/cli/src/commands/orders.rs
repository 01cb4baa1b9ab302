//! Order administration commands.
//!
//! # Usage
//!
//! ```bash
//! px-cli orders list --email ada@example.com
//! px-cli orders show 42
//! px-cli orders status 42 delivered
//! ```

use sqlx::PgPool;
use tracing::info;

use px_shop_core::{Email, OrderId, OrderStatus};
use px_shop_storefront::db::{OrderRepository, UserRepository};
use px_shop_storefront::models::Order;

use super::CliError;

/// List recent orders.
///
/// With `email`, lists every order of that customer and ignores `limit`.
///
/// # Errors
///
/// Returns `CliError::InvalidArgument` for an unknown status or malformed
/// email, `CliError::NotFound` if no user has the email.
pub async fn list(
    pool: &PgPool,
    status: Option<&str>,
    email: Option<&str>,
    limit: i64,
) -> Result<(), CliError> {
    let status = status
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(CliError::InvalidArgument)?;

    let repo = OrderRepository::new(pool);
    let orders = match email {
        Some(email) => {
            let email = Email::parse(email).map_err(|e| CliError::InvalidArgument(e.to_string()))?;
            let user = UserRepository::new(pool)
                .get_by_email(&email)
                .await?
                .ok_or_else(|| CliError::NotFound(format!("user {email}")))?;
            repo.list_for_user(user.id)
                .await?
                .into_iter()
                .filter(|order| status.is_none_or(|s| order.status == s))
                .collect()
        }
        None => repo.list_recent(status, limit).await?,
    };

    info!("Orders ({})", orders.len());
    for order in &orders {
        log_summary(order);
    }
    Ok(())
}

/// Show one order with its lines.
///
/// # Errors
///
/// Returns `CliError::NotFound` if no order has this id.
pub async fn show(pool: &PgPool, id: i32) -> Result<(), CliError> {
    let order = OrderRepository::new(pool)
        .get(OrderId::new(id))
        .await?
        .ok_or_else(|| CliError::NotFound(format!("order {id}")))?;

    log_summary(&order);
    for item in &order.items {
        info!(
            "    product #{:<3} x{:<3} @ {}",
            item.product_id, item.quantity, item.price
        );
    }
    Ok(())
}

/// Change the status of an order.
///
/// # Errors
///
/// Returns `CliError::InvalidArgument` for an unknown status and
/// `CliError::Repository` if the order does not exist.
pub async fn set_status(pool: &PgPool, id: i32, status: &str) -> Result<(), CliError> {
    let status: OrderStatus = status.parse().map_err(CliError::InvalidArgument)?;
    OrderRepository::new(pool)
        .update_status(OrderId::new(id), status)
        .await?;
    info!("Order #{id} is now {}", status.label());
    Ok(())
}

fn log_summary(order: &Order) {
    info!(
        "  #{:<5} user {:<5} {:<10} {:>3} items  {:>10}  {}",
        order.id,
        order.user_id,
        order.status.as_str(),
        order.item_count(),
        order.total,
        order.created_at.format("%Y-%m-%d %H:%M")
    );
}
