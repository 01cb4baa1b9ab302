//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::middleware::auth::RequireAuth;
use crate::models::Order;
use crate::routes::{PageContext, money};
use crate::state::AppState;

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub number: String,
    pub placed: String,
    pub status: &'static str,
    pub item_count: u32,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.id.to_string(),
            placed: order.created_at.format("%B %-d, %Y").to_string(),
            status: order.status.label(),
            item_count: order.item_count(),
            total: money(order.total),
        }
    }
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub page: PageContext,
    pub greeting: String,
    pub email: String,
    pub orders: Vec<OrderView>,
    /// The record store could not be reached; history is shown as unavailable.
    pub orders_unavailable: bool,
}

/// Display account overview page.
///
/// A record-store failure degrades to an empty history rather than an error
/// page.
#[instrument(skip(state, session, current_user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current_user): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let page = PageContext::load(&session).await?;

    let (orders, orders_unavailable) = match OrderRepository::new(state.pool())
        .list_for_user(current_user.id)
        .await
    {
        Ok(orders) => (orders.iter().map(OrderView::from).collect(), false),
        Err(e) => {
            tracing::warn!(error = %e, user_id = %current_user.id, "Failed to load order history");
            (Vec::new(), true)
        }
    };

    Ok(AccountIndexTemplate {
        page,
        greeting: current_user.greeting_name().to_string(),
        email: current_user.email.to_string(),
        orders,
        orders_unavailable,
    })
}
