//! Coupon seeding command.
//!
//! Upserts coupons by code from a YAML file, so re-running a seed is safe
//! and edits to an existing code update it in place (usage counters are
//! left untouched).
//!
//! # Seed file format
//!
//! ```yaml
//! coupons:
//!   - code: WELCOME10
//!     discount_type: percentage
//!     discount_value: "10"
//!     min_order_amount: 100000
//!     max_uses: 500
//!     expires_at: 2026-12-31T23:59:59Z
//!     is_active: true
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use seesaw_core::{Coupon, DiscountType};
use seesaw_storefront::db::CouponRepository;

use super::CommandError;

/// Top-level seed file shape.
#[derive(Debug, Deserialize)]
struct SeedFile {
    coupons: Vec<SeedCoupon>,
}

/// One coupon entry in the seed file.
#[derive(Debug, Deserialize)]
struct SeedCoupon {
    code: String,
    discount_type: DiscountType,
    discount_value: Decimal,
    #[serde(default)]
    min_order_amount: Option<i64>,
    #[serde(default)]
    max_uses: Option<i32>,
    #[serde(default)]
    starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl From<SeedCoupon> for Coupon {
    fn from(seed: SeedCoupon) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: Self::normalize_code(&seed.code),
            discount_type: seed.discount_type,
            discount_value: seed.discount_value,
            min_order_amount: seed.min_order_amount,
            max_uses: seed.max_uses,
            used_count: 0,
            starts_at: seed.starts_at,
            expires_at: seed.expires_at,
            is_active: seed.is_active,
        }
    }
}

/// Upsert coupons from a YAML seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a database
/// write fails.
pub async fn coupons(path: &Path) -> Result<(), CommandError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CommandError::SeedFile(format!("{}: {e}", path.display())))?;
    let seed: SeedFile = serde_yaml::from_str(&raw)
        .map_err(|e| CommandError::SeedFile(format!("{}: {e}", path.display())))?;

    let database_url = super::database_url()?;
    let pool = seesaw_storefront::db::create_pool(&database_url).await?;
    let repo = CouponRepository::new(&pool);

    let count = seed.coupons.len();
    for seed_coupon in seed.coupons {
        let coupon = Coupon::from(seed_coupon);
        tracing::info!(code = %coupon.code, "upserting coupon");
        repo.upsert(&coupon).await?;
    }

    tracing::info!("Seeded {count} coupons");
    Ok(())
}
