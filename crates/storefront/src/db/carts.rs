//! Saved cart lines per user.
//!
//! Session carts are not written here; these records are managed from the
//! CLI and shown on the account page.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use px_shop_core::{ProductId, UserId};

use super::RepositoryError;

/// One saved cart line.
#[derive(Debug, Clone)]
pub struct CartRecord {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    user_id: i32,
    product_id: i32,
    quantity: i32,
    added_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for CartRecord {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid cart quantity for user {} product {}",
                row.user_id, row.product_id
            ))
        })?;
        Ok(Self {
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity,
            added_at: row.added_at,
        })
    }
}

/// Repository for saved cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved lines for `user_id` in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_for_user(&self, user_id: UserId) -> Result<Vec<CartRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(
            r"
            SELECT user_id, product_id, quantity, added_at
            FROM storefront.cart_item
            WHERE user_id = $1
            ORDER BY added_at, product_id
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Set the quantity of a saved line, inserting it if needed. Zero deletes it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        if quantity == 0 {
            self.remove(user_id, product_id).await?;
            return Ok(());
        }

        sqlx::query(
            r"
            INSERT INTO storefront.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete one saved line. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2")
                .bind(user_id.as_i32())
                .bind(product_id.as_i32())
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every saved line for `user_id`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
