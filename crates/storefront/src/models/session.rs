//! Session-related types.
//!
//! Types stored in the session for authentication and per-visitor state.

use serde::{Deserialize, Serialize};

use px_shop_core::{Email, UserId};

use crate::models::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    pub display_name: Option<String>,
}

impl CurrentUser {
    /// Profile greeting: display name, else the email local part.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.email.local_part())
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the visitor's [`px_shop_core::CartStore`].
    pub const CART: &str = "cart";

    /// Key for the visitor's [`px_shop_core::WishlistStore`].
    pub const WISHLIST: &str = "wishlist";

    /// Key for the in-progress [`px_shop_core::CheckoutFlow`].
    pub const CHECKOUT: &str = "checkout";
}
