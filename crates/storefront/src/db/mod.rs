//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `seesaw_storefront`
//!
//! The remote store for authenticated shoppers (the session is the store for
//! anonymous ones):
//!
//! ## Tables
//!
//! - `carts` - One row per `(user_id, product_id, size, color)` cart line
//! - `wishlists` - One row per `(user_id, product_id)`
//! - `coupons` - Discount codes
//! - `coupon_redemptions` - One row per `(coupon_id, order_number)`; makes
//!   usage counting idempotent under duplicate webhook delivery
//! - `orders` - Confirmed orders, keyed by order number
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p seesaw-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod carts;
pub mod coupons;
pub mod orders;
pub mod wishlists;

pub use carts::CartRepository;
pub use coupons::CouponRepository;
pub use orders::OrderRepository;
pub use wishlists::WishlistRepository;

/// Errors produced by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value violates a domain invariant.
    #[error("Data corruption: {0}")]
    DataCorruption(String),

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
