//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use px_shop_core::catalog::ALL_CATEGORIES;

use crate::error::AppError;
use crate::routes::{PageContext, ProductCard};
use crate::services::stores;
use crate::state::AppState;

/// Number of products in the featured grid.
const FEATURED_COUNT: usize = 4;

/// A selling point in the "why shop with us" grid.
pub struct Highlight {
    pub title: &'static str,
    pub description: &'static str,
}

const HIGHLIGHTS: [Highlight; 6] = [
    Highlight {
        title: "Advanced Search",
        description: "Find exactly what you need with our powerful search and filter system",
    },
    Highlight {
        title: "Wishlist & Favorites",
        description: "Save items for later and create personalized collections",
    },
    Highlight {
        title: "Real-time Analytics",
        description: "See trending products and popular items in real-time",
    },
    Highlight {
        title: "Secure Checkout",
        description: "Bank-level security with multiple payment options",
    },
    Highlight {
        title: "Fast Delivery",
        description: "Express shipping available with real-time tracking",
    },
    Highlight {
        title: "Gift Cards",
        description: "Perfect gifts for friends and family",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductCard>,
    /// Category shortcuts (without "All").
    pub categories: Vec<&'static str>,
    pub highlights: &'static [Highlight],
}

/// Display the home page.
#[instrument(skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let page = PageContext::load(&session).await?;
    let wishlist = stores::load_wishlist(&session).await?;
    let catalog = state.catalog();

    Ok(HomeTemplate {
        page,
        featured: ProductCard::list(catalog.featured(FEATURED_COUNT), &wishlist),
        categories: catalog
            .categories()
            .iter()
            .copied()
            .filter(|c| *c != ALL_CATEGORIES)
            .collect(),
        highlights: &HIGHLIGHTS,
    })
}
