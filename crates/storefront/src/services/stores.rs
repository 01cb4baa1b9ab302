//! Per-visitor stores kept in the session.
//!
//! Each handler loads the store it needs, applies one operation and writes it
//! back. A missing key yields an empty store.

use serde::{Serialize, de::DeserializeOwned};
use tower_sessions::Session;
use tower_sessions::session::Error;

use px_shop_core::{CartStore, CheckoutFlow, WishlistStore};

use crate::models::session::{CurrentUser, keys};

async fn load<T>(session: &Session, key: &str) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    Ok(session.get::<T>(key).await?.unwrap_or_default())
}

async fn save<T>(session: &Session, key: &str, value: &T) -> Result<(), Error>
where
    T: Serialize + Sync,
{
    session.insert(key, value).await
}

/// The visitor's cart (empty if none yet).
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<CartStore, Error> {
    load(session, keys::CART).await
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &CartStore) -> Result<(), Error> {
    save(session, keys::CART, cart).await
}

/// The visitor's wishlist (empty if none yet).
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_wishlist(session: &Session) -> Result<WishlistStore, Error> {
    load(session, keys::WISHLIST).await
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_wishlist(session: &Session, wishlist: &WishlistStore) -> Result<(), Error> {
    save(session, keys::WISHLIST, wishlist).await
}

/// The checkout in progress, if any.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_checkout(session: &Session) -> Result<Option<CheckoutFlow>, Error> {
    session.get::<CheckoutFlow>(keys::CHECKOUT).await
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_checkout(session: &Session, flow: &CheckoutFlow) -> Result<(), Error> {
    save(session, keys::CHECKOUT, flow).await
}

/// The signed-in user, if any.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn current_user(session: &Session) -> Result<Option<CurrentUser>, Error> {
    session.get::<CurrentUser>(keys::CURRENT_USER).await
}
