//! Order repository.
//!
//! Orders are written exactly once per order number. The confirmation
//! endpoint and the payment webhook race for the same insert; whichever
//! lands first wins and the other is a no-op, which `insert` reports so the
//! caller can skip side effects like coupon redemption bookkeeping.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use seesaw_core::{Email, Order, OrderNumber, OrderStatus, UserId};

use super::RepositoryError;

/// Row shape for the `orders` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_number: String,
    user_id: Option<uuid::Uuid>,
    email: String,
    status: String,
    subtotal: i64,
    shipping_cost: i64,
    discount_amount: i64,
    total: i64,
    coupon_code: Option<String>,
    shipping_address: serde_json::Value,
    items: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.order_number))
        })?;

        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let shipping_address = serde_json::from_value(row.shipping_address).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "order {}: bad shipping address: {e}",
                row.order_number
            ))
        })?;

        let items = serde_json::from_value(row.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: bad items: {e}", row.order_number))
        })?;

        Ok(Self {
            order_number: OrderNumber::new(row.order_number),
            user_id: row.user_id.map(UserId::new),
            email,
            status,
            subtotal: row.subtotal,
            shipping_cost: row.shipping_cost,
            discount_amount: row.discount_amount,
            total: row.total,
            coupon_code: row.coupon_code,
            shipping_address,
            items,
            created_at: row.created_at,
        })
    }
}

/// Repository for confirmed orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order if none exists for its order number.
    ///
    /// Returns `true` if this call created the order, `false` if one
    /// already existed (duplicate confirmation or webhook delivery).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails, or
    /// `RepositoryError::DataCorruption` if the order payload cannot be
    /// serialized.
    pub async fn insert(&self, order: &Order) -> Result<bool, RepositoryError> {
        let shipping_address = serde_json::to_value(&order.shipping_address).map_err(|e| {
            RepositoryError::DataCorruption(format!("unserializable shipping address: {e}"))
        })?;
        let items = serde_json::to_value(&order.items)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable items: {e}")))?;

        let inserted = sqlx::query(
            r"
            INSERT INTO orders (order_number, user_id, email, status, subtotal, shipping_cost,
                                discount_amount, total, coupon_code, shipping_address, items,
                                created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (order_number) DO NOTHING
            ",
        )
        .bind(order.order_number.as_str())
        .bind(order.user_id.map(uuid::Uuid::from))
        .bind(&order.email)
        .bind(order.status.to_string())
        .bind(order.subtotal)
        .bind(order.shipping_cost)
        .bind(order.discount_amount)
        .bind(order.total)
        .bind(&order.coupon_code)
        .bind(shipping_address)
        .bind(items)
        .bind(order.created_at)
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(inserted == 1)
    }

    /// Fetch an order by order number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get(&self, order_number: &OrderNumber) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT order_number, user_id, email, status, subtotal, shipping_cost,
                   discount_amount, total, coupon_code, shipping_address, items, created_at
            FROM orders
            WHERE order_number = $1
            ",
        )
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Advance an order's status. No-op if the order is absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn update_status(
        &self,
        order_number: &OrderNumber,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE orders SET status = $2 WHERE order_number = $1")
            .bind(order_number)
            .bind(status.to_string())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
