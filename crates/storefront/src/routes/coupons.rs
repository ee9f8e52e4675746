//! Coupon validation route handler.
//!
//! Contract: `POST /api/coupons/validate {code, subtotal}` answers
//! `200 {valid, coupon, discount_amount}` or `400 {error}` with the
//! specific validation failure, which the frontend surfaces inline under
//! the code-entry field.

use axum::{Json, extract::State};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use seesaw_core::coupon::evaluate;
use seesaw_core::{Coupon, CouponError, DiscountType};

use crate::db::CouponRepository;
use crate::error::Result;
use crate::state::AppState;

/// Validation request body.
#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    /// Order subtotal in minor currency units.
    pub subtotal: i64,
}

/// Public view of a coupon: enough to render the applied discount, nothing
/// about usage counters.
#[derive(Debug, Serialize)]
pub struct CouponView {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
}

impl From<&Coupon> for CouponView {
    fn from(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value,
        }
    }
}

/// Successful validation response.
#[derive(Debug, Serialize)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    pub coupon: CouponView,
    /// Discount amount in minor currency units.
    pub discount_amount: i64,
}

/// Validate a coupon code against an order subtotal.
#[instrument(skip(state, form), fields(code = %form.code))]
pub async fn validate(
    State(state): State<AppState>,
    Json(form): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>> {
    let coupon = CouponRepository::new(state.pool())
        .find_by_code(&form.code)
        .await?
        .ok_or(CouponError::InvalidCode)?;

    let discount_amount = evaluate(&coupon, form.subtotal, Utc::now())?;

    Ok(Json(ValidateCouponResponse {
        valid: true,
        coupon: CouponView::from(&coupon),
        discount_amount,
    }))
}
