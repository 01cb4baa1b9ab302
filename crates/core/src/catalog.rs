//! Static product catalog.
//!
//! The storefront serves a fixed list of products bundled with the crate
//! (`data/catalog.json`). Products are immutable once loaded; browsing is a
//! filter + sort over the in-memory list.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

/// Category filter value that matches every product.
pub const ALL_CATEGORIES: &str = "All";

/// Category labels offered by the catalog filter, in display order.
pub const CATEGORIES: &[&str] = &[
    ALL_CATEGORIES,
    "Electronics",
    "Fitness",
    "Home & Kitchen",
    "Furniture",
    "Beauty",
    "Smart Home",
    "Lifestyle",
    "Gaming",
    "Home & Garden",
    "Photography",
    "Bedding",
    "Food & Gifts",
    "Health & Nutrition",
    "Kitchen",
    "Accessories",
];

/// Price bands offered by the catalog filter.
pub const PRICE_RANGES: [PriceRange; 6] = [
    PriceRange::new("Under $25", 0, Some(25)),
    PriceRange::new("$25 - $50", 25, Some(50)),
    PriceRange::new("$50 - $100", 50, Some(100)),
    PriceRange::new("$100 - $200", 100, Some(200)),
    PriceRange::new("$200 - $500", 200, Some(500)),
    PriceRange::new("Over $500", 500, None),
];

/// Errors loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id {0} in catalog")]
    DuplicateId(ProductId),
}

/// A product offered by the shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price in dollars.
    pub price: Decimal,
    /// Path of the product image under the static root.
    pub image: String,
    pub category: String,
    pub stock: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub reviews: Option<u32>,
    #[serde(default)]
    pub badge: Option<String>,
}

impl Product {
    /// Whether the product can currently be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

/// A labelled price band; `max` is exclusive, `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub label: &'static str,
    pub min: Decimal,
    pub max: Option<Decimal>,
}

impl PriceRange {
    const fn new(label: &'static str, min: u32, max: Option<u32>) -> Self {
        Self {
            label,
            min: Decimal::from_parts(min, 0, 0, false, 0),
            max: match max {
                Some(max) => Some(Decimal::from_parts(max, 0, 0, false, 0)),
                None => None,
            },
        }
    }

    /// Whether `price` falls inside this band.
    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.min && self.max.is_none_or(|max| price < max)
    }
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOption {
    /// Catalog order.
    #[default]
    #[serde(rename = "featured")]
    Featured,
    #[serde(rename = "price-asc")]
    PriceAsc,
    #[serde(rename = "price-desc")]
    PriceDesc,
    #[serde(rename = "rating-desc")]
    RatingDesc,
    /// Most recently added first (highest id first).
    #[serde(rename = "newest")]
    Newest,
    /// Most reviewed first.
    #[serde(rename = "bestselling")]
    BestSelling,
}

impl SortOption {
    /// All options in display order.
    pub const ALL: [Self; 6] = [
        Self::Featured,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::RatingDesc,
        Self::Newest,
        Self::BestSelling,
    ];

    /// Query-string value.
    #[must_use]
    pub const fn value(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::RatingDesc => "rating-desc",
            Self::Newest => "newest",
            Self::BestSelling => "bestselling",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::RatingDesc => "Rating: High to Low",
            Self::Newest => "Newest First",
            Self::BestSelling => "Best Selling",
        }
    }

    /// Parse a query-string value, falling back to `Featured`.
    #[must_use]
    pub fn from_value(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|option| option.value() == value)
            .unwrap_or_default()
    }
}

/// Filter and sort parameters for [`Catalog::search`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Category label; `None` or `"All"` disables the filter.
    pub category: Option<String>,
    /// Index into [`PRICE_RANGES`].
    pub price_range: Option<usize>,
    /// Case-insensitive text matched against name, description and tags.
    pub text: Option<String>,
    pub sort: SortOption,
}

/// The in-memory product list.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Load the catalog bundled with this crate.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the bundled data is malformed.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Parse a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON and
    /// [`CatalogError::DuplicateId`] if two products share an id.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    /// Build a catalog from already-loaded products.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two products share an id.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateId(product.id));
            }
        }
        Ok(Self { products })
    }

    /// All products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Category filter labels, starting with [`ALL_CATEGORIES`].
    #[must_use]
    pub const fn categories(&self) -> &'static [&'static str] {
        CATEGORIES
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// The first `count` products, used for the home page.
    #[must_use]
    pub fn featured(&self, count: usize) -> Vec<&Product> {
        self.products.iter().take(count).collect()
    }

    /// Products in the same category as `product`, excluding it.
    #[must_use]
    pub fn related(&self, product: &Product, count: usize) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.category == product.category && p.id != product.id)
            .take(count)
            .collect()
    }

    /// Filter and sort the catalog.
    #[must_use]
    pub fn search(&self, query: &CatalogQuery) -> Vec<&Product> {
        let category = query
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES);
        let range = query.price_range.and_then(|i| PRICE_RANGES.get(i));
        let needle = query
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut results: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .filter(|p| range.is_none_or(|r| r.contains(p.price)))
            .filter(|p| needle.as_deref().is_none_or(|n| p.matches_text(n)))
            .collect();

        match query.sort {
            SortOption::Featured => {}
            SortOption::PriceAsc => results.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOption::PriceDesc => results.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOption::RatingDesc => results.sort_by(|a, b| {
                b.rating
                    .unwrap_or_default()
                    .total_cmp(&a.rating.unwrap_or_default())
            }),
            SortOption::Newest => results.sort_by(|a, b| b.id.cmp(&a.id)),
            SortOption::BestSelling => {
                results.sort_by(|a, b| b.reviews.unwrap_or(0).cmp(&a.reviews.unwrap_or(0)));
            }
        }

        results
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::bundled().unwrap()
    }

    #[test]
    fn test_bundled_catalog_loads_all_products() {
        let catalog = catalog();
        assert_eq!(catalog.products().len(), 20);
        let headphones = catalog.get(ProductId::new(1)).unwrap();
        assert_eq!(headphones.name, "Premium Wireless Headphones");
        assert_eq!(headphones.price.to_string(), "299.99");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": 1, "name": "A", "description": "", "price": "1.00", "image": "", "category": "X", "stock": 1},
            {"id": 1, "name": "B", "description": "", "price": "2.00", "image": "", "category": "X", "stock": 1}
        ]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_category_filter() {
        let catalog = catalog();
        let query = CatalogQuery {
            category: Some("Electronics".to_string()),
            ..CatalogQuery::default()
        };
        let results = catalog.search(&query);
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|p| p.category == "Electronics"));

        let all = CatalogQuery {
            category: Some(ALL_CATEGORIES.to_string()),
            ..CatalogQuery::default()
        };
        assert_eq!(catalog.search(&all).len(), 20);
    }

    #[test]
    fn test_price_range_is_half_open() {
        let range = PRICE_RANGES[1];
        assert!(range.contains(Decimal::from(25)));
        assert!(!range.contains(Decimal::from(50)));
        assert!(PRICE_RANGES[5].contains(Decimal::from(10_000)));
    }

    #[test]
    fn test_price_filter_and_sort() {
        let catalog = catalog();
        let query = CatalogQuery {
            price_range: Some(0),
            sort: SortOption::PriceAsc,
            ..CatalogQuery::default()
        };
        let results = catalog.search(&query);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Smart LED Light Bulbs");
    }

    #[test]
    fn test_text_search_matches_tags_case_insensitively() {
        let catalog = catalog();
        let query = CatalogQuery {
            text: Some("  RFID ".to_string()),
            ..CatalogQuery::default()
        };
        let results = catalog.search(&query);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, ProductId::new(20));
    }

    #[test]
    fn test_sort_orders() {
        let catalog = catalog();
        let by = |sort| {
            catalog
                .search(&CatalogQuery {
                    sort,
                    ..CatalogQuery::default()
                })
                .first()
                .map(|p| p.id.as_i32())
                .unwrap()
        };
        assert_eq!(by(SortOption::Featured), 1);
        assert_eq!(by(SortOption::PriceDesc), 13);
        assert_eq!(by(SortOption::Newest), 20);
        assert_eq!(by(SortOption::BestSelling), 11);
    }

    #[test]
    fn test_sort_option_from_value_falls_back() {
        assert_eq!(SortOption::from_value("price-desc"), SortOption::PriceDesc);
        assert_eq!(SortOption::from_value("bogus"), SortOption::Featured);
    }

    #[test]
    fn test_related_excludes_self() {
        let catalog = catalog();
        let speaker = catalog.get(ProductId::new(7)).unwrap();
        let related = catalog.related(speaker, 10);
        assert!(!related.is_empty());
        assert!(related.iter().all(|p| p.id != speaker.id));
        assert!(related.iter().all(|p| p.category == "Electronics"));
    }
}
