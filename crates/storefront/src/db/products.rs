//! Product record repository.
//!
//! The storefront browses the bundled catalog in memory; these records are
//! the administrable copy used by the CLI and the record store.

use rust_decimal::Decimal;
use sqlx::PgPool;

use px_shop_core::{Product, ProductId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    image: String,
    category: String,
    stock: i32,
    tags: Vec<String>,
    rating: Option<f32>,
    reviews: Option<i32>,
    badge: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative stock for product {}", row.id))
        })?;
        let reviews = row
            .reviews
            .map(u32::try_from)
            .transpose()
            .map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "negative review count for product {}",
                    row.id
                ))
            })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            image: row.image,
            category: row.category,
            stock,
            tags: row.tags,
            rating: row.rating,
            reviews,
            badge: row.badge,
        })
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image, category, stock, tags, rating, reviews, badge";

/// Repository for product records.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Products whose category equals `category`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE category = $1 ORDER BY id"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a product, or overwrite the record with the same id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.product
                (id, name, description, price, image, category, stock, tags, rating, reviews, badge)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                image = EXCLUDED.image,
                category = EXCLUDED.category,
                stock = EXCLUDED.stock,
                tags = EXCLUDED.tags,
                rating = EXCLUDED.rating,
                reviews = EXCLUDED.reviews,
                badge = EXCLUDED.badge,
                updated_at = NOW()
            ",
        )
        .bind(product.id.as_i32())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(&product.category)
        .bind(i32::try_from(product.stock).unwrap_or(i32::MAX))
        .bind(&product.tags)
        .bind(product.rating)
        .bind(product.reviews.map(|r| i32::try_from(r).unwrap_or(i32::MAX)))
        .bind(&product.badge)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set the stock level of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn update_stock(&self, id: ProductId, stock: u32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.product SET stock = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(i32::try_from(stock).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product record. Returns whether a record was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
