//! Wishlist route handlers.

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

use px_shop_core::ProductId;

use crate::error::AppError;
use crate::middleware::is_htmx;
use crate::routes::{PageContext, ProductCard};
use crate::services::stores;
use crate::state::AppState;

/// HTMX event fired whenever the wishlist changes.
const WISHLIST_UPDATED: &str = "wishlist-updated";

/// Wishlist form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: i32,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistTemplate {
    pub page: PageContext,
    pub items: Vec<ProductCard>,
}

/// Heart button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: i32,
    pub saved: bool,
}

/// Display the wishlist page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<impl IntoResponse, AppError> {
    let page = PageContext::load(&session).await?;
    let wishlist = stores::load_wishlist(&session).await?;

    Ok(WishlistTemplate {
        page,
        items: ProductCard::list(wishlist.items(), &wishlist),
    })
}

/// Save or unsave a product from its card.
///
/// HTMX gets the updated heart button; plain forms go to the wishlist page.
#[instrument(skip(state, session, headers))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<WishlistForm>,
) -> Result<Response, AppError> {
    let product = state
        .catalog()
        .get(ProductId::new(form.product_id))
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let mut wishlist = stores::load_wishlist(&session).await?;
    let saved = wishlist.toggle(product.clone());
    stores::save_wishlist(&session, &wishlist).await?;

    tracing::debug!(product_id = form.product_id, saved, "Wishlist toggled");

    if is_htmx(&headers) {
        Ok((
            AppendHeaders([("HX-Trigger", WISHLIST_UPDATED)]),
            WishlistButtonTemplate {
                product_id: form.product_id,
                saved,
            },
        )
            .into_response())
    } else {
        Ok(Redirect::to("/wishlist").into_response())
    }
}

/// Remove a product from the wishlist page.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Form(form): Form<WishlistForm>,
) -> Result<Redirect, AppError> {
    let mut wishlist = stores::load_wishlist(&session).await?;
    wishlist.remove_from_wishlist(ProductId::new(form.product_id));
    stores::save_wishlist(&session, &wishlist).await?;

    Ok(Redirect::to("/wishlist"))
}

/// Empty the wishlist.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Redirect, AppError> {
    let mut wishlist = stores::load_wishlist(&session).await?;
    wishlist.clear_wishlist();
    stores::save_wishlist(&session, &wishlist).await?;

    Ok(Redirect::to("/wishlist"))
}
