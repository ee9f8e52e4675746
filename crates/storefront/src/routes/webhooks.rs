//! Payment gateway webhook handler.
//!
//! Gateways redeliver webhooks, so every effect here is idempotent: the
//! order write keys on the order number, and coupon redemption keys on
//! `(coupon, order_number)`. `checkout.completed` races the confirmation
//! redirect for the same order; whichever lands first wins and the loser
//! is a no-op.

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use seesaw_core::{OrderNumber, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::routes::checkout::{CheckoutMetadata, record_paid_order};
use crate::state::AppState;

/// Header carrying the gateway's webhook shared secret.
const WEBHOOK_TOKEN_HEADER: &str = "x-webhook-token";

/// Webhook envelope: event type plus an event-specific payload.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

/// `checkout.completed` payload.
#[derive(Debug, Deserialize)]
struct CheckoutCompleted {
    order_number: String,
    payment_status: String,
    metadata: serde_json::Value,
}

/// `shipment.updated` payload.
#[derive(Debug, Deserialize)]
struct ShipmentUpdated {
    order_number: String,
    status: String,
}

/// Handle a gateway webhook delivery.
///
/// Unknown event types are acknowledged with 200 so the gateway does not
/// redeliver them forever; malformed payloads of known types are rejected
/// with 400.
#[instrument(skip(state, headers, envelope), fields(event_type = %envelope.event_type))]
pub async fn payments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(envelope): Json<WebhookEnvelope>,
) -> Result<StatusCode> {
    verify_token(&state, &headers)?;

    match envelope.event_type.as_str() {
        "checkout.completed" => {
            let event: CheckoutCompleted = serde_json::from_value(envelope.data)
                .map_err(|e| AppError::BadRequest(format!("bad checkout.completed data: {e}")))?;

            if event.payment_status != "paid" {
                tracing::info!(
                    order_number = %event.order_number,
                    status = %event.payment_status,
                    "ignoring unpaid checkout event"
                );
                return Ok(StatusCode::OK);
            }

            let metadata: CheckoutMetadata = serde_json::from_value(event.metadata)
                .map_err(|e| AppError::BadRequest(format!("bad checkout metadata: {e}")))?;

            record_paid_order(&state, OrderNumber::new(event.order_number), metadata).await?;
        }
        "shipment.updated" => {
            let event: ShipmentUpdated = serde_json::from_value(envelope.data)
                .map_err(|e| AppError::BadRequest(format!("bad shipment.updated data: {e}")))?;

            let status: OrderStatus = event
                .status
                .parse()
                .map_err(|e: String| AppError::BadRequest(e))?;

            OrderRepository::new(state.pool())
                .update_status(&OrderNumber::new(event.order_number), status)
                .await?;
        }
        other => {
            tracing::debug!(event_type = other, "ignoring unhandled webhook event");
        }
    }

    Ok(StatusCode::OK)
}

/// Check the shared-secret header the gateway signs deliveries with.
fn verify_token(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let provided = headers
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing webhook token".into()))?;

    let expected = state.config().payments.webhook_secret.expose_secret();
    if provided != expected {
        return Err(AppError::Unauthorized("invalid webhook token".into()));
    }

    Ok(())
}
