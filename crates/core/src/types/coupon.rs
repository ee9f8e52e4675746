//! Coupon record and validation error types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the order subtotal.
    Percentage,
    /// `discount_value` is an absolute amount in minor currency units.
    Fixed,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percentage => write!(f, "percentage"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            _ => Err(format!("invalid discount type: {s}")),
        }
    }
}

/// A discount coupon.
///
/// `used_count <= max_uses` (when `max_uses` is set) is enforced at
/// redemption time, not structurally. Redemption increments `used_count`
/// exactly once per confirmed order; the storefront keys the increment on
/// the order number so duplicate payment webhooks cannot double-count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    /// Unique code, stored and displayed uppercase. Lookup is
    /// case-insensitive.
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// Minimum order subtotal (minor units) for the coupon to apply.
    pub min_order_amount: Option<i64>,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Coupon {
    /// Normalize a user-entered code for storage and lookup.
    #[must_use]
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }
}

/// Why a coupon cannot be applied.
///
/// Messages are user-facing; they surface inline under the code-entry field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponError {
    /// No coupon exists for the entered code.
    #[error("invalid coupon code")]
    InvalidCode,

    /// The coupon has been deactivated.
    #[error("this coupon is no longer active")]
    Inactive,

    /// The coupon's start date is in the future.
    #[error("this coupon is not valid yet")]
    NotYetValid,

    /// The coupon's expiry date has passed.
    #[error("this coupon has expired")]
    Expired,

    /// The coupon has been redeemed `max_uses` times.
    #[error("this coupon has reached its usage limit")]
    UsageLimitReached,

    /// The order subtotal is below the coupon's minimum.
    #[error("order subtotal is below the minimum of {minimum} for this coupon")]
    BelowMinimum {
        /// Required minimum subtotal in minor units.
        minimum: i64,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(Coupon::normalize_code("  summer10 "), "SUMMER10");
        assert_eq!(Coupon::normalize_code("SUMMER10"), "SUMMER10");
    }

    #[test]
    fn test_discount_type_roundtrip() {
        for dt in [DiscountType::Percentage, DiscountType::Fixed] {
            let parsed: DiscountType = dt.to_string().parse().unwrap();
            assert_eq!(parsed, dt);
        }
        assert!("bogus".parse::<DiscountType>().is_err());
    }
}
