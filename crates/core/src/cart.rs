//! Session cart.
//!
//! Line items are keyed by product id and kept in insertion order. Totals are
//! derived on every read; nothing is cached.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{ProductId, TAX_RATE, price::round_cents};

/// A product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: u32,
}

impl CartItem {
    /// Snapshot a catalog product as a cart line.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
        }
    }

    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Order summary shown on the cart and checkout pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub item_count: u32,
    pub subtotal: Decimal,
    /// Shipping is free on every order.
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartStore {
    items: Vec<CartItem>,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Insert `item`, or add its quantity to the existing line for the same
    /// product. A zero quantity is ignored.
    pub fn add_item(&mut self, item: CartItem) {
        if item.quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.items.push(item),
        }
    }

    /// Set the absolute quantity of a line. Quantities of zero or below
    /// remove it; unknown ids are ignored.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        if let Some(line) = self.items.iter_mut().find(|line| line.id == id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Remove a line; unknown ids are ignored.
    pub fn remove_item(&mut self, id: ProductId) {
        self.items.retain(|line| line.id != id);
    }

    pub fn clear_cart(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Subtotal, free shipping, tax and grand total.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let subtotal = self.total_amount();
        let tax = round_cents(subtotal * TAX_RATE);
        CartSummary {
            item_count: self.total_items(),
            subtotal,
            shipping: Decimal::ZERO,
            tax,
            total: subtotal + tax,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn item(id: i32, price: &str, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Decimal::from_str(price).unwrap(),
            image: format!("/images/{id}.jpg"),
            quantity,
        }
    }

    fn expected_total(cart: &CartStore) -> Decimal {
        cart.items()
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum()
    }

    #[test]
    fn test_add_item_inserts_then_increments() {
        let mut cart = CartStore::new();
        cart.add_item(item(1, "10.00", 1));
        cart.add_item(item(2, "5.50", 2));
        cart.add_item(item(1, "10.00", 3));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 4);
        assert_eq!(cart.total_items(), 6);
        assert_eq!(cart.total_amount(), Decimal::from_str("51.00").unwrap());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = CartStore::new();
        for id in [3, 1, 2] {
            cart.add_item(item(id, "1.00", 1));
        }
        cart.add_item(item(1, "1.00", 1));
        let ids: Vec<i32> = cart.items().iter().map(|i| i.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = CartStore::new();
        cart.add_item(item(1, "10.00", 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_to_zero_removes() {
        let mut cart = CartStore::new();
        cart.add_item(item(1, "10.00", 2));
        cart.add_item(item(2, "3.00", 1));

        cart.update_quantity(ProductId::new(1), 0);

        assert!(cart.get(ProductId::new(1)).is_none());
        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.total_amount(), Decimal::from_str("3.00").unwrap());
    }

    #[test]
    fn test_update_quantity_negative_removes() {
        let mut cart = CartStore::new();
        cart.add_item(item(1, "10.00", 2));
        cart.update_quantity(ProductId::new(1), -1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_sets_absolute_value() {
        let mut cart = CartStore::new();
        cart.add_item(item(1, "2.25", 5));
        cart.update_quantity(ProductId::new(1), 2);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_amount(), Decimal::from_str("4.50").unwrap());
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut cart = CartStore::new();
        cart.add_item(item(1, "1.00", 1));
        let before = cart.clone();

        cart.update_quantity(ProductId::new(99), 4);
        cart.remove_item(ProductId::new(99));

        assert_eq!(cart, before);
    }

    #[test]
    fn test_total_amount_tracks_every_mutation() {
        let mut cart = CartStore::new();
        let steps: Vec<Box<dyn Fn(&mut CartStore)>> = vec![
            Box::new(|c| c.add_item(item(1, "299.99", 1))),
            Box::new(|c| c.add_item(item(2, "39.99", 3))),
            Box::new(|c| c.update_quantity(ProductId::new(1), 2)),
            Box::new(|c| c.add_item(item(3, "0.10", 7))),
            Box::new(|c| c.remove_item(ProductId::new(2))),
            Box::new(|c| c.update_quantity(ProductId::new(3), 0)),
            Box::new(|c| c.add_item(item(2, "39.99", 1))),
        ];
        for step in steps {
            step(&mut cart);
            assert_eq!(cart.total_amount(), expected_total(&cart));
        }
        assert_eq!(cart.total_amount(), Decimal::from_str("639.97").unwrap());
    }

    #[test]
    fn test_clear_cart() {
        let mut cart = CartStore::new();
        cart.add_item(item(1, "1.00", 1));
        cart.clear_cart();
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_summary_adds_tax() {
        let mut cart = CartStore::new();
        cart.add_item(item(1, "299.99", 1));
        cart.add_item(item(5, "39.99", 2));

        let summary = cart.summary();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, Decimal::from_str("379.97").unwrap());
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.tax, Decimal::from_str("30.40").unwrap());
        assert_eq!(summary.total, Decimal::from_str("410.37").unwrap());
    }

    #[test]
    fn test_cart_survives_session_serialization() {
        let mut cart = CartStore::new();
        cart.add_item(item(4, "399.99", 1));
        let json = serde_json::to_value(&cart).unwrap();
        let back: CartStore = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
