//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Products
//! GET  /products               - Catalog (category, price, sort, q)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (count badge, triggers cart-updated)
//! POST /cart/update            - Set quantity (cart_items fragment)
//! POST /cart/remove            - Remove item (cart_items fragment)
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Wishlist
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/toggle        - Save/unsave (heart button fragment)
//! POST /wishlist/remove        - Remove item
//! POST /wishlist/clear         - Empty the wishlist
//!
//! # Checkout
//! GET  /checkout               - Current step
//! POST /checkout/shipping      - Submit shipping details
//! POST /checkout/payment       - Submit payment details
//! POST /checkout/back          - Previous step
//! POST /checkout/place         - Place the order (simulated)
//! GET  /checkout/complete      - Confirmation
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Account
//! GET  /account                - Profile and order history
//! GET  /contact                - Contact form
//! POST /contact                - Send a message (simulated)
//! ```
//!
//! Everything except the public pages sits behind [`auth_gate`].

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod products;
pub mod wishlist;

#[cfg(test)]
mod tests;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use rust_decimal::Decimal;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Session, SessionManagerLayer, SessionStore};

use px_shop_core::{Price, Product, WishlistStore};

use crate::error::AppError;
use crate::middleware::{
    auth_gate, auth_rate_limiter, contact_rate_limiter, request_id_middleware,
    security_headers_middleware,
};
use crate::services::stores;
use crate::state::AppState;

/// Directory served under `/static`.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

// =============================================================================
// Shared View Data
// =============================================================================

/// Header data every full page needs: who is signed in and the badge counts.
#[derive(Clone, Default)]
pub struct PageContext {
    pub greeting: Option<String>,
    pub cart_count: u32,
    pub wishlist_count: usize,
}

impl PageContext {
    /// Read the header data from the visitor's session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        let user = stores::current_user(session).await?;
        let cart = stores::load_cart(session).await?;
        let wishlist = stores::load_wishlist(session).await?;

        Ok(Self {
            greeting: user.as_ref().map(|u| u.greeting_name().to_string()),
            cart_count: cart.total_items(),
            wishlist_count: wishlist.total_wishlist_items(),
        })
    }
}

/// Format an amount in the store currency.
#[must_use]
pub fn money(amount: Decimal) -> String {
    Price::usd(amount).display()
}

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCard {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub category: String,
    pub stock: u32,
    pub in_stock: bool,
    pub tags: Vec<String>,
    pub rating: Option<String>,
    pub reviews: u32,
    pub badge: Option<String>,
    /// Whether the visitor has this product in their wishlist.
    pub saved: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, wishlist: &WishlistStore) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: money(product.price),
            image: product.image.clone(),
            category: product.category.clone(),
            stock: product.stock,
            in_stock: product.in_stock(),
            tags: product.tags.clone(),
            rating: product.rating.map(|r| format!("{r:.1}")),
            reviews: product.reviews.unwrap_or(0),
            badge: product.badge.clone(),
            saved: wishlist.is_in_wishlist(product.id),
        }
    }

    /// Cards for `products`, marking the ones in `wishlist`.
    #[must_use]
    pub fn list<'a>(
        products: impl IntoIterator<Item = &'a Product>,
        wishlist: &WishlistStore,
    ) -> Vec<Self> {
        products
            .into_iter()
            .map(|p| Self::new(p, wishlist))
            .collect()
    }
}

/// Not-found page.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate;

/// Fallback for unknown paths.
pub async fn fallback(request: Request) -> AppError {
    AppError::NotFound(request.uri().path().to_string())
}

// =============================================================================
// Health
// =============================================================================

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
///
/// Form submissions are rate limited; the pages themselves are not.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            post(auth::login)
                .layer(limiter.clone())
                .get(auth::login_page),
        )
        .route(
            "/register",
            post(auth::register)
                .layer(limiter)
                .get(auth::register_page),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/remove", post(wishlist::remove))
        .route("/clear", post(wishlist::clear))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/shipping", post(checkout::submit_shipping))
        .route("/payment", post(checkout::submit_payment))
        .route("/back", post(checkout::back))
        .route("/place", post(checkout::place))
        .route("/complete", get(checkout::complete))
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
        .route("/account", get(account::index))
        .route(
            "/contact",
            post(contact::submit)
                .layer(contact_rate_limiter())
                .get(contact::show),
        )
}

/// Build the complete application with its middleware stack.
///
/// `session_layer` is generic over the store so tests can run against
/// `tower_sessions::MemoryStore`.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(fallback)
        .layer(from_fn(auth_gate))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
