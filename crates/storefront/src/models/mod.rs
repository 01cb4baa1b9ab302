//! Domain models for storefront.

pub mod order;
pub mod session;
pub mod user;

pub use order::{NewOrderItem, Order, OrderItem};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
