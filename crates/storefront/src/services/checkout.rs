//! Order placement.

use std::time::Duration;

use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use px_shop_core::{CheckoutFlow, OrderConfirmation};

use crate::error::{AppError, add_breadcrumb};
use crate::services::processing::ProcessingTask;
use crate::services::stores;

/// Place the order for the checkout in `session`.
///
/// Locks the flow, waits `delay` to simulate payment processing, then clears
/// the cart and moves the flow to Complete. The lock is saved before the wait
/// so a second submission from the same visitor is refused.
///
/// The session record is read once, before the wait, and written whole after
/// it. Cart or wishlist changes made from another tab while the order is
/// processing are overwritten by that write.
///
/// # Errors
///
/// Returns `AppError::Checkout` if the flow is not ready to place
/// (wrong step, already processing, empty cart, incomplete payment).
#[instrument(skip(session))]
pub async fn place_order(session: &Session, delay: Duration) -> Result<OrderConfirmation, AppError> {
    let mut flow = stores::load_checkout(session)
        .await?
        .unwrap_or_else(CheckoutFlow::new);
    let mut cart = stores::load_cart(session).await?;

    flow.begin_placement(&cart, Utc::now())?;
    stores::save_checkout(session, &flow).await?;
    session.save().await?;

    add_breadcrumb("checkout", "Placing order", None);
    ProcessingTask::start(delay).wait().await?;

    let confirmation =
        OrderConfirmation::from_cart(order_reference(), &cart, flow.shipping(), Utc::now());
    cart.clear_cart();
    flow.complete(confirmation.clone());
    stores::save_cart(session, &cart).await?;
    stores::save_checkout(session, &flow).await?;

    tracing::info!(
        reference = %confirmation.reference,
        total = %confirmation.total,
        items = confirmation.items.len(),
        "Order placed"
    );

    Ok(confirmation)
}

/// Short human-readable order reference, e.g. `PX-3F9A1C2B`.
fn order_reference() -> String {
    let id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("PX-{}", id.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_reference_shape() {
        let reference = order_reference();
        assert!(reference.starts_with("PX-"));
        assert_eq!(reference.len(), 11);
        assert!(reference.chars().skip(3).all(|c| c.is_ascii_hexdigit()));
    }
}
