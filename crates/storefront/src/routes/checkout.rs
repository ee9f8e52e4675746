//! Checkout route handlers.
//!
//! `POST /api/checkout` derives gateway line items from the active cart,
//! prices the order (coupon, flat shipping), generates the order number,
//! and returns the hosted checkout URL. The serialized order is carried in
//! the session metadata so the confirmation endpoint and the payment
//! webhook can both reconstruct it without trusting the client.
//!
//! `GET /checkout/confirm` is the gateway's success redirect: it exchanges
//! the session id for a payment-status verification, writes the order
//! (idempotent on order number), redeems the coupon (idempotent per order
//! number), and clears the active cart.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use seesaw_core::coupon::evaluate;
use seesaw_core::{
    CartLine, CouponError, Email, Order, OrderItem, OrderNumber, OrderStatus, ShippingAddress,
    UserId,
};

use crate::db::{CouponRepository, OrderRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CurrentIdentity;
use crate::services::payments::{CheckoutLineItem, CreateSessionRequest, PaymentStatus};
use crate::services::sync::{clear_cart, current_cart};
use crate::state::AppState;

/// Order number prefix.
const ORDER_PREFIX: &str = "SW";

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    pub shipping_address: ShippingAddress,
    pub coupon_code: Option<String>,
}

/// Checkout response: where to send the shopper.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub order_number: OrderNumber,
}

/// Confirmation query parameters, appended by the gateway redirect.
#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub order_number: String,
    pub session_id: String,
}

/// Confirmation response.
#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub order: Order,
}

/// The order snapshot carried through the gateway as session metadata and
/// echoed back on verification and webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutMetadata {
    pub user_id: Option<UserId>,
    pub email: Email,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub discount_amount: i64,
    pub total: i64,
    pub coupon_id: Option<Uuid>,
    pub coupon_code: Option<String>,
}

/// Generate a globally unique order number: prefix, UTC timestamp, random
/// suffix.
fn generate_order_number() -> OrderNumber {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: u32 = rand::rng().random_range(0..1_000_000);
    OrderNumber::new(format!("{ORDER_PREFIX}-{timestamp}-{suffix:06}"))
}

/// Create a gateway checkout session from the active cart.
#[instrument(skip(state, session, form))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
    Json(form): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let email =
        Email::parse(&form.email).map_err(|e| AppError::BadRequest(format!("invalid email: {e}")))?;

    let lines = current_cart(&state, &session, identity).await?;
    if lines.is_empty() {
        return Err(AppError::BadRequest("cart is empty".into()));
    }

    let subtotal: i64 = lines.iter().map(CartLine::line_total).sum();

    // Re-validate the coupon at checkout time; an expired code fails here
    // with the same inline message as the validate endpoint.
    let coupon = match &form.coupon_code {
        Some(code) => Some(
            CouponRepository::new(state.pool())
                .find_by_code(code)
                .await?
                .ok_or(CouponError::InvalidCode)?,
        ),
        None => None,
    };
    let discount_amount = match &coupon {
        Some(c) => evaluate(c, subtotal, Utc::now())?,
        None => 0,
    };

    let shipping_cost = state.config().shipping_flat_rate;
    let total = subtotal - discount_amount + shipping_cost;

    let order_number = generate_order_number();
    let metadata = CheckoutMetadata {
        user_id: identity.user_id(),
        email,
        items: lines.iter().map(OrderItem::from).collect(),
        shipping_address: form.shipping_address,
        subtotal,
        shipping_cost,
        discount_amount,
        total,
        coupon_id: coupon.as_ref().map(|c| c.id),
        coupon_code: coupon.as_ref().map(|c| c.code.clone()),
    };
    let metadata = serde_json::to_value(&metadata)
        .map_err(|e| AppError::Internal(format!("unserializable checkout metadata: {e}")))?;

    let base_url = &state.config().base_url;
    let request = CreateSessionRequest {
        order_number: order_number.to_string(),
        line_items: lines
            .iter()
            .map(|l| CheckoutLineItem {
                name: l.name.clone(),
                amount: l.price,
                quantity: l.quantity,
            })
            .collect(),
        discount_amount,
        shipping_cost,
        success_url: format!(
            "{base_url}/checkout/confirm?order_number={order_number}&session_id={{CHECKOUT_SESSION_ID}}"
        ),
        cancel_url: format!("{base_url}/cart"),
        metadata,
    };

    add_breadcrumb(
        "checkout",
        "Created checkout session",
        Some(&[("order_number", order_number.as_str())]),
    );

    let checkout = state.payments().create_session(&request).await?;

    Ok(Json(CheckoutResponse {
        checkout_url: checkout.url,
        order_number,
    }))
}

/// Verify payment and write the order.
#[instrument(skip(state, session, query), fields(order_number = %query.order_number))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<ConfirmResponse>> {
    let gateway_session = state.payments().get_session(&query.session_id).await?;

    if gateway_session.order_number != query.order_number {
        return Err(AppError::BadRequest(
            "order number does not match checkout session".into(),
        ));
    }

    if gateway_session.payment_status != PaymentStatus::Paid {
        return Err(AppError::BadRequest("payment not completed".into()));
    }

    let metadata: CheckoutMetadata = serde_json::from_value(gateway_session.metadata)
        .map_err(|e| AppError::Internal(format!("bad gateway metadata: {e}")))?;

    let order_number = OrderNumber::new(query.order_number);
    let (order, _created) = record_paid_order(&state, order_number, metadata).await?;

    // The purchased cart is done either way; a duplicate confirmation just
    // clears an already-empty cart.
    clear_cart(&state, &session, identity).await?;

    Ok(Json(ConfirmResponse { order }))
}

/// Look up a confirmed order, e.g. when the confirmation page reloads.
///
/// Guest orders are retrievable by order number alone (the number is
/// unguessable); orders tied to an account additionally require that
/// account's identity.
#[instrument(skip(state), fields(order_number = %order_number))]
pub async fn show_order(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(order_number): Path<String>,
) -> Result<Json<ConfirmResponse>> {
    let order_number = OrderNumber::new(order_number);
    let order = OrderRepository::new(state.pool())
        .get(&order_number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_number}")))?;

    if let Some(owner) = order.user_id
        && identity.user_id() != Some(owner)
    {
        return Err(AppError::NotFound(format!("order {order_number}")));
    }

    Ok(Json(ConfirmResponse { order }))
}

/// Write the order for a confirmed payment and redeem its coupon, both
/// idempotent on the order number. Shared by the confirmation endpoint and
/// the payment webhook; whichever runs first creates the order.
pub(crate) async fn record_paid_order(
    state: &AppState,
    order_number: OrderNumber,
    metadata: CheckoutMetadata,
) -> Result<(Order, bool)> {
    let order = Order {
        order_number,
        user_id: metadata.user_id,
        email: metadata.email,
        status: OrderStatus::Paid,
        subtotal: metadata.subtotal,
        shipping_cost: metadata.shipping_cost,
        discount_amount: metadata.discount_amount,
        total: metadata.total,
        coupon_code: metadata.coupon_code,
        shipping_address: metadata.shipping_address,
        items: metadata.items,
        created_at: Utc::now(),
    };

    let created = OrderRepository::new(state.pool()).insert(&order).await?;

    if let Some(coupon_id) = metadata.coupon_id {
        let redeemed = CouponRepository::new(state.pool())
            .redeem(coupon_id, &order.order_number)
            .await?;
        if redeemed {
            tracing::info!(
                order_number = %order.order_number,
                "coupon redeemed"
            );
        }
    }

    if created {
        tracing::info!(order_number = %order.order_number, total = order.total, "order created");
    }

    Ok((order, created))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let s = number.as_str();

        let mut parts = s.split('-');
        assert_eq!(parts.next(), Some("SW"));

        let timestamp = parts.next().expect("timestamp segment");
        assert_eq!(timestamp.len(), 14);
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));

        let suffix = parts.next().expect("random segment");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));

        assert_eq!(parts.next(), None);
    }
}
