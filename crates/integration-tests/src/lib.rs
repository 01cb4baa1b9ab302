//! Integration tests for PX Shop.
//!
//! These tests drive a running storefront over HTTP. They require:
//! - A migrated `PostgreSQL` database (`px-cli migrate`)
//! - The storefront running (`cargo run -p px-shop-storefront`) with
//!   `CHECKOUT_DELAY_MS` and `CONTACT_DELAY_MS` set low
//!
//! They are `#[ignore]`d by default:
//!
//! ```bash
//! cargo test -p px-shop-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_URL` overrides the default `http://localhost:3000`.

use reqwest::{Client, Response, redirect};

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Absolute URL for `path` on the storefront.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", storefront_url())
}

/// A client with its own cookie jar that does not follow redirects.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique address for a throwaway account.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Register a throwaway account; the client is signed in afterwards.
///
/// # Errors
///
/// Returns the transport error if the request fails.
pub async fn register(client: &Client, email: &str) -> Result<Response, reqwest::Error> {
    client
        .post(url("/auth/register"))
        .form(&[
            ("display_name", "Integration"),
            ("email", email),
            ("password", "correct-horse-battery"),
            ("password_confirm", "correct-horse-battery"),
        ])
        .send()
        .await
}

/// `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
