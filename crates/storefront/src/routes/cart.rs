//! Cart route handlers.
//!
//! Cart operations use HTMX for in-place updates. Without HTMX the same
//! endpoints redirect back to the cart page. The cart itself lives in the
//! visitor's session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use px_shop_core::{CartItem, CartStore, ProductId};

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::is_htmx;
use crate::routes::{PageContext, money};
use crate::services::stores;
use crate::state::AppState;

/// HTMX event fired whenever the cart changes.
const CART_UPDATED: &str = "cart-updated";

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.as_i32(),
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            price: money(item.price),
            line_total: money(item.line_total()),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartStore> for CartView {
    fn from(cart: &CartStore) -> Self {
        let summary = cart.summary();
        Self {
            items: cart.items().iter().map(CartLineView::from).collect(),
            item_count: summary.item_count,
            subtotal: money(summary.subtotal),
            shipping: "Free".to_string(),
            tax: money(summary.tax),
            total: money(summary.total),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Respond to a cart change: the items fragment for HTMX, else back to `/cart`.
fn cart_changed(headers: &HeaderMap, cart: &CartStore) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", CART_UPDATED)]),
            CartItemsTemplate {
                cart: CartView::from(cart),
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<impl IntoResponse, AppError> {
    let page = PageContext::load(&session).await?;
    let cart = stores::load_cart(&session).await?;

    Ok(CartShowTemplate {
        page,
        cart: CartView::from(&cart),
    })
}

/// Add item to cart.
///
/// Returns the count badge with an HTMX trigger so other cart widgets refresh.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let product = state
        .catalog()
        .get(ProductId::new(form.product_id))
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    if !product.in_stock() {
        return Err(AppError::BadRequest(format!("{} is out of stock", product.name)));
    }

    let mut cart = stores::load_cart(&session).await?;
    cart.add_item(CartItem::from_product(product, form.quantity.unwrap_or(1)));
    stores::save_cart(&session, &cart).await?;

    let product_id = form.product_id.to_string();
    add_breadcrumb("cart", "Added item", Some(&[("product_id", &product_id)]));

    if is_htmx(&headers) {
        Ok((
            AppendHeaders([("HX-Trigger", CART_UPDATED)]),
            CartCountTemplate {
                count: cart.total_items(),
            },
        )
            .into_response())
    } else {
        Ok(Redirect::to("/cart").into_response())
    }
}

/// Update cart item quantity. Zero or less removes the line.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response, AppError> {
    let mut cart = stores::load_cart(&session).await?;
    cart.update_quantity(ProductId::new(form.product_id), form.quantity);
    stores::save_cart(&session, &cart).await?;

    Ok(cart_changed(&headers, &cart))
}

/// Remove item from cart.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response, AppError> {
    let mut cart = stores::load_cart(&session).await?;
    cart.remove_item(ProductId::new(form.product_id));
    stores::save_cart(&session, &cart).await?;

    Ok(cart_changed(&headers, &cart))
}

/// Empty the cart.
#[instrument(skip(session, headers))]
pub async fn clear(session: Session, headers: HeaderMap) -> Result<Response, AppError> {
    let mut cart = stores::load_cart(&session).await?;
    cart.clear_cart();
    stores::save_cart(&session, &cart).await?;

    Ok(cart_changed(&headers, &cart))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse, AppError> {
    let cart = stores::load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.total_items(),
    })
}
