//! Router-level tests over the full middleware stack.
//!
//! Sessions live in a `MemoryStore`; the database pool points at a closed
//! port so anything that reaches `PostgreSQL` fails fast.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use tower_sessions::session::{Id, Record};
use tower_sessions::{MemoryStore, SessionStore};

use px_shop_core::{Catalog, Email, UserId};

use super::app;
use crate::config::StorefrontConfig;
use crate::middleware::create_session_layer;
use crate::middleware::session::SESSION_COOKIE_NAME;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

const FORM: &str = "application/x-www-form-urlencoded";

struct TestShop {
    router: Router,
    store: MemoryStore,
}

impl TestShop {
    fn new() -> Self {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_DATABASE_URL" => Some("postgres://px:px@127.0.0.1:1/px_shop".to_string()),
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            "CHECKOUT_DELAY_MS" | "CONTACT_DELAY_MS" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(250))
            .connect_lazy(config.database_url.expose_secret())
            .unwrap();

        let store = MemoryStore::default();
        let session_layer = create_session_layer(store.clone(), &config);
        let state = AppState::new(config, pool, Catalog::bundled().unwrap());

        Self {
            router: app(state, session_layer),
            store,
        }
    }

    /// Session cookie for a visitor who is already signed in.
    async fn signed_in(&self) -> String {
        let user = CurrentUser {
            id: UserId::new(7),
            email: Email::parse("ada@example.com").unwrap(),
            display_name: Some("Ada".to_string()),
        };
        let mut record = Record {
            id: Id::default(),
            data: HashMap::from([(
                session_keys::CURRENT_USER.to_string(),
                serde_json::to_value(&user).unwrap(),
            )]),
            expiry_date: OffsetDateTime::now_utc() + CookieDuration::hours(1),
        };
        self.store.create(&mut record).await.unwrap();
        format!("{SESSION_COOKIE_NAME}={}", record.id)
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::get(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, path: &str, cookie: &str, body: &str) -> Response {
        self.send(post_request(path, cookie, body, false)).await
    }

    async fn htmx_post(&self, path: &str, cookie: &str, body: &str) -> Response {
        self.send(post_request(path, cookie, body, true)).await
    }
}

fn post_request(path: &str, cookie: &str, body: &str, htmx: bool) -> Request<Body> {
    let mut builder = Request::post(path)
        .header(header::CONTENT_TYPE, FORM)
        .header("x-forwarded-for", "203.0.113.9");
    if !cookie.is_empty() {
        builder = builder.header(header::COOKIE, cookie);
    }
    if htmx {
        builder = builder.header("hx-request", "true");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

const SHIPPING: &str = "first_name=Ada&last_name=Lovelace&email=ada%40example.com&phone=555-0100\
    &address=12+Analytical+Way&city=London&state=LDN&zip_code=10001&country=United+States";
const PAYMENT: &str =
    "card_number=4242424242424242&expiry_date=1230&cvv=123&cardholder_name=Ada+Lovelace";

// =============================================================================
// Health and Static
// =============================================================================

#[tokio::test]
async fn test_health_is_ok() {
    let shop = TestShop::new();
    let response = shop.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_without_database() {
    let shop = TestShop::new();
    let response = shop.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_static_assets_are_cacheable() {
    let shop = TestShop::new();
    let response = shop.get("/static/css/site.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=86400"
    );
}

#[tokio::test]
async fn test_pages_carry_security_headers_and_request_id() {
    let shop = TestShop::new();
    let response = shop.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store, max-age=0");
    assert!(headers.contains_key("x-request-id"));
}

// =============================================================================
// Public Pages
// =============================================================================

#[tokio::test]
async fn test_home_page_for_anonymous_visitor() {
    let shop = TestShop::new();
    let response = shop.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Featured Products"));
    assert!(body.contains("Sign In"));
}

#[tokio::test]
async fn test_catalog_search_filters_products() {
    let shop = TestShop::new();
    let response = shop.get("/products?q=headphones", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Premium Wireless Headphones"));
    assert!(!body.contains("Yoga Mat Premium"));
}

#[tokio::test]
async fn test_product_page() {
    let shop = TestShop::new();
    let response = shop.get("/products/1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Premium Wireless Headphones"));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let shop = TestShop::new();
    for path in ["/products/999", "/products/headphones"] {
        let response = shop.get(path, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

// =============================================================================
// Auth Gate
// =============================================================================

#[tokio::test]
async fn test_private_pages_redirect_anonymous_visitors() {
    let shop = TestShop::new();
    let response = shop.get("/cart", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?redirect=%2Fcart");
}

#[tokio::test]
async fn test_htmx_cart_add_while_anonymous() {
    let shop = TestShop::new();
    let response = shop.htmx_post("/cart/add", "", "product_id=1").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("hx-redirect").unwrap(),
        "/auth/login?redirect=%2Fcart%2Fadd"
    );
}

#[tokio::test]
async fn test_unknown_path_depends_on_sign_in() {
    let shop = TestShop::new();
    let response = shop.get("/no-such-page", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = shop.signed_in().await;
    let response = shop.get("/no-such-page", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page Not Found"));
}

#[tokio::test]
async fn test_login_page_skips_signed_in_visitor() {
    let shop = TestShop::new();
    let response = shop.get("/auth/login?redirect=%2Fcart", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("name=\"redirect\""));

    let cookie = shop.signed_in().await;
    let response = shop
        .get("/auth/login?redirect=%2Fcart", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_login_redirect_stays_on_site() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    for target in ["%2F%09%2Fevil.test", "%2F%5Cevil.test", "%2F%2Fevil.test"] {
        let response = shop
            .get(&format!("/auth/login?redirect={target}"), Some(&cookie))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/", "redirect={target}");
    }
}

#[tokio::test]
async fn test_login_with_blank_fields() {
    let shop = TestShop::new();
    let response = shop.post("/auth/login", "", "email=&password=").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Please fill in all fields"));
}

#[tokio::test]
async fn test_register_with_mismatched_passwords() {
    let shop = TestShop::new();
    let response = shop
        .post(
            "/auth/register",
            "",
            "email=ada%40example.com&password=hunter22&password_confirm=hunter23",
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Passwords do not match"));
}

#[tokio::test]
async fn test_logout_keeps_cart_but_closes_gate() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    shop.post("/cart/add", &cookie, "product_id=3").await;

    let response = shop.post("/auth/logout", &cookie, "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = shop.get("/cart", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = shop.get("/", Some(&cookie)).await;
    assert!(body_text(response).await.contains("Sign In"));
}

// =============================================================================
// Cart and Wishlist
// =============================================================================

#[tokio::test]
async fn test_htmx_add_to_cart_updates_count() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;

    let response = shop
        .htmx_post("/cart/add", &cookie, "product_id=1&quantity=2")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("hx-trigger").unwrap(), "cart-updated");
    assert!(body_text(response).await.contains(">2</span>"));

    shop.htmx_post("/cart/add", &cookie, "product_id=1").await;
    let response = shop.get("/cart/count", Some(&cookie)).await;
    assert!(body_text(response).await.contains(">3</span>"));
}

#[tokio::test]
async fn test_cart_page_lists_items() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;

    let response = shop.post("/cart/add", &cookie, "product_id=5").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");

    let body = body_text(shop.get("/cart", Some(&cookie)).await).await;
    assert!(body.contains("Wireless Charging Pad"));
    assert!(body.contains("$39.99"));
}

#[tokio::test]
async fn test_cart_update_to_zero_removes_line() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    shop.post("/cart/add", &cookie, "product_id=5").await;

    let response = shop
        .htmx_post("/cart/update", &cookie, "product_id=5&quantity=0")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_add_unknown_product() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    let response = shop.post("/cart/add", &cookie, "product_id=999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wishlist_toggle() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;

    let response = shop
        .htmx_post("/wishlist/toggle", &cookie, "product_id=7")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("hx-trigger").unwrap(),
        "wishlist-updated"
    );

    let body = body_text(shop.get("/wishlist", Some(&cookie)).await).await;
    assert!(body.contains("Bluetooth Speaker"));

    shop.htmx_post("/wishlist/toggle", &cookie, "product_id=7")
        .await;
    let body = body_text(shop.get("/wishlist", Some(&cookie)).await).await;
    assert!(!body.contains("Bluetooth Speaker"));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_with_empty_cart_goes_to_cart() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    let response = shop.get("/checkout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_full_checkout() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    shop.post("/cart/add", &cookie, "product_id=3&quantity=2").await;

    // Shipping, with the account email pre-filled
    let body = body_text(shop.get("/checkout", Some(&cookie)).await).await;
    assert!(body.contains("ada@example.com"));

    let response = shop.post("/checkout/shipping", &cookie, "first_name=Ada").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Last name is required"));

    let response = shop.post("/checkout/shipping", &cookie, SHIPPING).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/checkout");

    // Payment
    let response = shop.post("/checkout/payment", &cookie, PAYMENT).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Review
    let body = body_text(shop.get("/checkout", Some(&cookie)).await).await;
    assert!(body.contains("4242"));
    assert!(!body.contains("4242424242424242"));
    assert!(body.contains("Designer Coffee Mug Set"));

    let response = shop.post("/checkout/place", &cookie, "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/checkout/complete");

    let body = body_text(shop.get("/checkout/complete", Some(&cookie)).await).await;
    assert!(body.contains("Order Confirmed!"));
    assert!(body.contains("PX-"));
    assert!(body.contains("Designer Coffee Mug Set"));

    let response = shop.get("/cart/count", Some(&cookie)).await;
    assert!(body_text(response).await.contains(">0</span>"));
}

#[tokio::test]
async fn test_checkout_back_returns_to_shipping() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    shop.post("/cart/add", &cookie, "product_id=3").await;
    shop.get("/checkout", Some(&cookie)).await;
    shop.post("/checkout/shipping", &cookie, SHIPPING).await;

    let response = shop.post("/checkout/back", &cookie, "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = body_text(shop.get("/checkout", Some(&cookie)).await).await;
    assert!(body.contains("Analytical Way"));
    assert!(body.contains("name=\"first_name\""));
}

#[tokio::test]
async fn test_place_before_review_is_refused() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    shop.post("/cart/add", &cookie, "product_id=3").await;
    shop.get("/checkout", Some(&cookie)).await;

    let response = shop.post("/checkout/place", &cookie, "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/checkout");
}

#[tokio::test]
async fn test_complete_without_order_redirects() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    let response = shop.get("/checkout/complete", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/checkout");
}

// =============================================================================
// Account and Contact
// =============================================================================

#[tokio::test]
async fn test_account_page_survives_database_outage() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;
    let response = shop.get("/account", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Hello, Ada!"));
    assert!(body.contains("temporarily unavailable"));
}

#[tokio::test]
async fn test_contact_form() {
    let shop = TestShop::new();
    let cookie = shop.signed_in().await;

    let response = shop.post("/contact", &cookie, "name=Ada").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(response).await;
    assert!(body.contains("Email is required"));
    assert!(body.contains("value=\"Ada\""));

    let response = shop
        .post(
            "/contact",
            &cookie,
            "name=Ada&email=ada%40example.com&subject=Hello&message=Where+is+my+order%3F",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Message Sent Successfully!"));
}
