//! Coupon repository.
//!
//! Codes are stored uppercase; lookups normalize the input first, which
//! gives case-insensitive matching without a functional index. Redemption
//! is keyed on `(coupon_id, order_number)` so a redelivered payment webhook
//! cannot increment `used_count` twice for the same order.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use seesaw_core::{Coupon, DiscountType, OrderNumber};

use super::RepositoryError;

/// Row shape for the `coupons` table.
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    code: String,
    discount_type: String,
    discount_value: Decimal,
    min_order_amount: Option<i64>,
    max_uses: Option<i32>,
    used_count: i32,
    starts_at: Option<chrono::DateTime<chrono::Utc>>,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
    is_active: bool,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount_type: DiscountType = row.discount_type.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("coupon {}: {e}", row.code))
        })?;

        Ok(Self {
            id: row.id,
            code: row.code,
            discount_type,
            discount_value: row.discount_value,
            min_order_amount: row.min_order_amount,
            max_uses: row.max_uses,
            used_count: row.used_count,
            starts_at: row.starts_at,
            expires_at: row.expires_at,
            is_active: row.is_active,
        })
    }
}

/// Repository for coupon lookup and redemption.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a coupon by code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored discount type is
    /// unknown.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let normalized = Coupon::normalize_code(code);

        let row = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT id, code, discount_type, discount_value, min_order_amount,
                   max_uses, used_count, starts_at, expires_at, is_active
            FROM coupons
            WHERE code = $1
            ",
        )
        .bind(&normalized)
        .fetch_optional(self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Redeem a coupon for an order, incrementing `used_count` at most once
    /// per order number.
    ///
    /// Returns `true` if this call performed the increment, `false` if the
    /// order had already redeemed the coupon (e.g. a redelivered webhook).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn redeem(
        &self,
        coupon_id: Uuid,
        order_number: &OrderNumber,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r"
            INSERT INTO coupon_redemptions (coupon_id, order_number)
            VALUES ($1, $2)
            ON CONFLICT (coupon_id, order_number) DO NOTHING
            ",
        )
        .bind(coupon_id)
        .bind(order_number)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 1 {
            sqlx::query("UPDATE coupons SET used_count = used_count + 1 WHERE id = $1")
                .bind(coupon_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted == 1)
    }

    /// Insert or replace a coupon by code. Used by seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn upsert(&self, coupon: &Coupon) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO coupons (id, code, discount_type, discount_value, min_order_amount,
                                 max_uses, used_count, starts_at, expires_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (code)
            DO UPDATE SET discount_type = EXCLUDED.discount_type,
                          discount_value = EXCLUDED.discount_value,
                          min_order_amount = EXCLUDED.min_order_amount,
                          max_uses = EXCLUDED.max_uses,
                          starts_at = EXCLUDED.starts_at,
                          expires_at = EXCLUDED.expires_at,
                          is_active = EXCLUDED.is_active
            ",
        )
        .bind(coupon.id)
        .bind(Coupon::normalize_code(&coupon.code))
        .bind(coupon.discount_type.to_string())
        .bind(coupon.discount_value)
        .bind(coupon.min_order_amount)
        .bind(coupon.max_uses)
        .bind(coupon.used_count)
        .bind(coupon.starts_at)
        .bind(coupon.expires_at)
        .bind(coupon.is_active)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
