//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Account registration and password sign-in
//! - `checkout` - Order placement over the session checkout flow
//! - `processing` - Simulated slow work (order placement, contact form)
//! - `stores` - Loading and saving the per-visitor session stores

pub mod auth;
pub mod checkout;
pub mod processing;
pub mod stores;

pub use auth::{AuthError, AuthService};
pub use processing::{ProcessingError, ProcessingTask};
