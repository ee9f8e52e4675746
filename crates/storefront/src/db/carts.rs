//! Cart repository for the remote (per-user) cart store.
//!
//! Conflict key is `(user_id, product_id, size, color)`. Upserts replace the
//! stored quantity with the incoming one: the additive behavior of repeated
//! adds lives in the pure reducer, which computes the new line before it is
//! persisted. The merge sweep reuses the same verbatim upsert, which is what
//! makes a local line overwrite the remote quantity on sign-in.

use sqlx::PgPool;

use seesaw_core::{CartLine, ProductId, UserId, VariantKey};

use super::RepositoryError;

/// Row shape for the `carts` table.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    product_id: String,
    name: String,
    price: i64,
    size: String,
    color: String,
    quantity: i32,
    image: Option<String>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity {} for product {}",
                row.quantity, row.product_id
            ))
        })?;

        Ok(Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            price: row.price,
            size: row.size,
            color: row.color,
            quantity,
            image_url: row.image,
        })
    }
}

/// Repository for per-user cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load all cart lines for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored row violates the
    /// quantity invariant.
    pub async fn load(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT product_id, name, price, size, color, quantity, image
            FROM carts
            WHERE user_id = $1
            ORDER BY updated_at, product_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    /// Insert or replace the line for this variant.
    ///
    /// On conflict the stored quantity is replaced, not summed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn upsert_line(
        &self,
        user_id: UserId,
        line: &CartLine,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO carts (user_id, product_id, name, price, size, color, quantity, image, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (user_id, product_id, size, color)
            DO UPDATE SET name = EXCLUDED.name,
                          price = EXCLUDED.price,
                          quantity = EXCLUDED.quantity,
                          image = EXCLUDED.image,
                          updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(&line.product_id)
        .bind(&line.name)
        .bind(line.price)
        .bind(&line.size)
        .bind(&line.color)
        .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
        .bind(&line.image_url)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set the quantity of an existing line. No-op if the line is absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        key: &VariantKey,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE carts
            SET quantity = $5, updated_at = NOW()
            WHERE user_id = $1 AND product_id = $2 AND size = $3 AND color = $4
            ",
        )
        .bind(user_id)
        .bind(&key.product_id)
        .bind(&key.size)
        .bind(&key.color)
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove the line for this variant. No-op if absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn remove_line(
        &self,
        user_id: UserId,
        key: &VariantKey,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM carts
            WHERE user_id = $1 AND product_id = $2 AND size = $3 AND color = $4
            ",
        )
        .bind(user_id)
        .bind(&key.product_id)
        .bind(&key.size)
        .bind(&key.color)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove every line for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
