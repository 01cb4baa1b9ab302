//! Saved-for-later products.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::ProductId;

/// The visitor's wishlist: a set of product snapshots keyed by id, kept in
/// the order they were saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WishlistStore {
    items: Vec<Product>,
}

impl WishlistStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Saved products in insertion order.
    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    /// Save `product` unless it is already saved.
    pub fn add_to_wishlist(&mut self, product: Product) {
        if !self.is_in_wishlist(product.id) {
            self.items.push(product);
        }
    }

    pub fn remove_from_wishlist(&mut self, id: ProductId) {
        self.items.retain(|p| p.id != id);
    }

    pub fn clear_wishlist(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn is_in_wishlist(&self, id: ProductId) -> bool {
        self.items.iter().any(|p| p.id == id)
    }

    #[must_use]
    pub fn total_wishlist_items(&self) -> usize {
        self.items.len()
    }

    /// Remove `product` if saved, save it otherwise. Returns whether the
    /// product is saved afterwards.
    pub fn toggle(&mut self, product: Product) -> bool {
        if self.is_in_wishlist(product.id) {
            self.remove_from_wishlist(product.id);
            false
        } else {
            self.items.push(product);
            true
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn product(id: i32) -> Product {
        Catalog::bundled()
            .unwrap()
            .get(ProductId::new(id))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut wishlist = WishlistStore::new();
        wishlist.add_to_wishlist(product(3));
        wishlist.add_to_wishlist(product(3));
        assert_eq!(wishlist.total_wishlist_items(), 1);
        assert!(wishlist.is_in_wishlist(ProductId::new(3)));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut wishlist = WishlistStore::new();
        wishlist.add_to_wishlist(product(1));
        wishlist.add_to_wishlist(product(2));

        wishlist.remove_from_wishlist(ProductId::new(1));
        assert!(!wishlist.is_in_wishlist(ProductId::new(1)));
        assert_eq!(wishlist.total_wishlist_items(), 1);

        wishlist.remove_from_wishlist(ProductId::new(42));
        assert_eq!(wishlist.total_wishlist_items(), 1);

        wishlist.clear_wishlist();
        assert_eq!(wishlist.total_wishlist_items(), 0);
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut wishlist = WishlistStore::new();
        assert!(wishlist.toggle(product(8)));
        assert!(wishlist.is_in_wishlist(ProductId::new(8)));
        assert!(!wishlist.toggle(product(8)));
        assert!(!wishlist.is_in_wishlist(ProductId::new(8)));
    }

    #[test]
    fn test_display_order_is_insertion_order() {
        let mut wishlist = WishlistStore::new();
        for id in [5, 2, 9] {
            wishlist.add_to_wishlist(product(id));
        }
        let ids: Vec<i32> = wishlist.items().iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }
}
