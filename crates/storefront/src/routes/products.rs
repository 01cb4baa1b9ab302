//! Product catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use px_shop_core::catalog::{ALL_CATEGORIES, PRICE_RANGES};
use px_shop_core::{CatalogQuery, ProductId, SortOption};

use crate::error::AppError;
use crate::routes::{PageContext, ProductCard};
use crate::services::stores;
use crate::state::AppState;

/// Number of related products on the detail page.
const RELATED_COUNT: usize = 4;

/// Catalog filter query parameters.
///
/// Everything is optional and parsed leniently: an unknown sort falls back to
/// featured, an unparseable price range is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub category: Option<String>,
    pub price: Option<String>,
    pub sort: Option<String>,
    pub q: Option<String>,
}

impl CatalogParams {
    fn to_query(&self) -> CatalogQuery {
        CatalogQuery {
            category: self.category.clone(),
            price_range: self
                .price
                .as_deref()
                .and_then(|p| p.parse::<usize>().ok())
                .filter(|i| *i < PRICE_RANGES.len()),
            text: self.q.clone(),
            sort: self
                .sort
                .as_deref()
                .map(SortOption::from_value)
                .unwrap_or_default(),
        }
    }
}

/// A `<select>` option or filter chip.
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<FilterOption>,
    pub price_ranges: Vec<FilterOption>,
    pub sort_options: Vec<FilterOption>,
    pub q: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductCard,
    pub related_products: Vec<ProductCard>,
}

/// Display the filtered product listing.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CatalogParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageContext::load(&session).await?;
    let wishlist = stores::load_wishlist(&session).await?;
    let query = params.to_query();
    let catalog = state.catalog();

    let active_category = query
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(ALL_CATEGORIES);

    let categories = catalog
        .categories()
        .iter()
        .map(|c| FilterOption {
            value: (*c).to_string(),
            label: (*c).to_string(),
            selected: *c == active_category,
        })
        .collect();

    let price_ranges = PRICE_RANGES
        .iter()
        .enumerate()
        .map(|(i, range)| FilterOption {
            value: i.to_string(),
            label: range.label.to_string(),
            selected: query.price_range == Some(i),
        })
        .collect();

    let sort_options = SortOption::ALL
        .iter()
        .map(|option| FilterOption {
            value: option.value().to_string(),
            label: option.label().to_string(),
            selected: *option == query.sort,
        })
        .collect();

    Ok(ProductsIndexTemplate {
        page,
        products: ProductCard::list(catalog.search(&query), &wishlist),
        categories,
        price_ranges,
        sort_options,
        q: params.q.unwrap_or_default(),
    })
}

/// Display product detail page.
///
/// Unknown or malformed ids render the not-found page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = id
        .parse::<i32>()
        .ok()
        .and_then(|id| state.catalog().get(ProductId::new(id)))
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let page = PageContext::load(&session).await?;
    let wishlist = stores::load_wishlist(&session).await?;

    Ok(ProductShowTemplate {
        page,
        product: ProductCard::new(product, &wishlist),
        related_products: ProductCard::list(
            state.catalog().related(product, RELATED_COUNT),
            &wishlist,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_parse_leniently() {
        let params = CatalogParams {
            category: Some("Electronics".to_string()),
            price: Some("not-a-number".to_string()),
            sort: Some("bogus".to_string()),
            q: None,
        };
        let query = params.to_query();
        assert_eq!(query.category.as_deref(), Some("Electronics"));
        assert_eq!(query.price_range, None);
        assert_eq!(query.sort, SortOption::Featured);
    }

    #[test]
    fn test_out_of_range_price_is_ignored() {
        let params = CatalogParams {
            price: Some("99".to_string()),
            ..CatalogParams::default()
        };
        assert_eq!(params.to_query().price_range, None);
    }

    #[test]
    fn test_known_sort_and_range() {
        let params = CatalogParams {
            price: Some("1".to_string()),
            sort: Some("price-desc".to_string()),
            ..CatalogParams::default()
        };
        let query = params.to_query();
        assert_eq!(query.price_range, Some(1));
        assert_eq!(query.sort, SortOption::PriceDesc);
    }
}
