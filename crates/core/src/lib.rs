//! PX Shop Core - Shared types and session stores.
//!
//! This crate provides the domain pieces used across all PX Shop components:
//! - `storefront` - Public-facing shop (axum, server-rendered)
//! - `cli` - Command-line tools for migrations and record administration
//!
//! # Architecture
//!
//! The core crate contains only types and pure state containers - no I/O, no
//! database access, no HTTP. Every store here is owned by a single visitor
//! session and mutated synchronously; the storefront loads it from the
//! session, applies one operation and writes it back.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`catalog`] - The bundled product catalog with filtering and sorting
//! - [`cart`] - Cart line items and derived totals
//! - [`wishlist`] - Saved-for-later product set
//! - [`checkout`] - Checkout step machine and form validation
//! - [`access`] - Public-path allow-list and the auth gate decision

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod types;
pub mod wishlist;

pub use access::{GateDecision, SessionState};
pub use cart::{CartItem, CartStore, CartSummary};
pub use catalog::{Catalog, CatalogError, CatalogQuery, PriceRange, Product, SortOption};
pub use checkout::{
    CheckoutError, CheckoutFlow, CheckoutStep, OrderConfirmation, PaymentInfo, ShippingInfo,
    ValidationErrors,
};
pub use types::*;
pub use wishlist::WishlistStore;
