//! Coupon discount evaluation.
//!
//! [`evaluate`] is a pure function: the caller supplies the coupon record,
//! the order subtotal, and the current time. Lookup failures map to
//! [`CouponError::InvalidCode`] at the lookup layer; everything else is
//! decided here, in a fixed short-circuit order so a coupon that is both
//! expired and under-minimum always reports the same failure.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{Coupon, CouponError, DiscountType};

/// Validate a coupon against an order subtotal and compute the discount
/// amount in minor currency units.
///
/// Validation gates, first failure wins:
/// 1. `is_active` is false
/// 2. `starts_at` is in the future
/// 3. `expires_at` is in the past
/// 4. `used_count` has reached `max_uses`
/// 5. `subtotal` is below `min_order_amount`
///
/// Percentage discounts round half-up. The returned amount never exceeds
/// the subtotal, so the merchandise total cannot go negative.
///
/// # Errors
///
/// Returns the first failing [`CouponError`] gate.
pub fn evaluate(coupon: &Coupon, subtotal: i64, now: DateTime<Utc>) -> Result<i64, CouponError> {
    if !coupon.is_active {
        return Err(CouponError::Inactive);
    }

    if let Some(starts_at) = coupon.starts_at
        && starts_at > now
    {
        return Err(CouponError::NotYetValid);
    }

    if let Some(expires_at) = coupon.expires_at
        && expires_at < now
    {
        return Err(CouponError::Expired);
    }

    if let Some(max_uses) = coupon.max_uses
        && coupon.used_count >= max_uses
    {
        return Err(CouponError::UsageLimitReached);
    }

    if let Some(minimum) = coupon.min_order_amount
        && subtotal < minimum
    {
        return Err(CouponError::BelowMinimum { minimum });
    }

    let amount = match coupon.discount_type {
        DiscountType::Percentage => {
            let raw = Decimal::from(subtotal) * coupon.discount_value / Decimal::from(100);
            raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .unwrap_or(subtotal)
        }
        DiscountType::Fixed => coupon
            .discount_value
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(subtotal),
    };

    Ok(amount.clamp(0, subtotal))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;

    fn coupon(discount_type: DiscountType, value: i64) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "SUMMER10".to_owned(),
            discount_type,
            discount_value: Decimal::from(value),
            min_order_amount: None,
            max_uses: None,
            used_count: 0,
            starts_at: None,
            expires_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_percentage_discount() {
        let c = coupon(DiscountType::Percentage, 20);
        assert_eq!(evaluate(&c, 100_000, Utc::now()).unwrap(), 20_000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let mut c = coupon(DiscountType::Percentage, 15);
        c.discount_value = Decimal::from(15);
        // 15% of 30 = 4.5 -> 5
        assert_eq!(evaluate(&c, 30, Utc::now()).unwrap(), 5);
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let c = coupon(DiscountType::Fixed, 50_000);
        assert_eq!(evaluate(&c, 30_000, Utc::now()).unwrap(), 30_000);
        assert_eq!(evaluate(&c, 80_000, Utc::now()).unwrap(), 50_000);
    }

    #[test]
    fn test_inactive() {
        let mut c = coupon(DiscountType::Percentage, 20);
        c.is_active = false;
        assert_eq!(
            evaluate(&c, 100_000, Utc::now()),
            Err(CouponError::Inactive)
        );
    }

    #[test]
    fn test_not_yet_valid() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Percentage, 20);
        c.starts_at = Some(now + Duration::hours(1));
        assert_eq!(evaluate(&c, 100_000, now), Err(CouponError::NotYetValid));
    }

    #[test]
    fn test_expired_beats_active_flag() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Percentage, 20);
        c.is_active = true;
        c.expires_at = Some(now - Duration::hours(1));
        assert_eq!(evaluate(&c, 100_000, now), Err(CouponError::Expired));
    }

    #[test]
    fn test_usage_limit_reached_at_boundary() {
        let mut c = coupon(DiscountType::Percentage, 20);
        c.max_uses = Some(5);
        c.used_count = 5;
        assert_eq!(
            evaluate(&c, 100_000, Utc::now()),
            Err(CouponError::UsageLimitReached)
        );

        c.used_count = 4;
        assert!(evaluate(&c, 100_000, Utc::now()).is_ok());
    }

    #[test]
    fn test_below_minimum() {
        let mut c = coupon(DiscountType::Fixed, 10_000);
        c.min_order_amount = Some(50_000);
        assert_eq!(
            evaluate(&c, 49_999, Utc::now()),
            Err(CouponError::BelowMinimum { minimum: 50_000 })
        );
        assert!(evaluate(&c, 50_000, Utc::now()).is_ok());
    }

    #[test]
    fn test_gate_order_expired_before_minimum() {
        // Expired and under-minimum at once: the date gate fires first.
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, 10_000);
        c.expires_at = Some(now - Duration::hours(1));
        c.min_order_amount = Some(50_000);
        assert_eq!(evaluate(&c, 10_000, now), Err(CouponError::Expired));
    }
}
