//! Payment gateway client.
//!
//! The gateway is an opaque checkout-session service: the storefront hands
//! it line items plus an order number and metadata, receives a redirect URL,
//! and later exchanges the session id for a payment-status verification.
//! All payment correctness (card handling, 3DS, retries) lives on the
//! gateway side.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PaymentConfig;

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("Gateway error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No session exists for the given id.
    #[error("Checkout session not found: {0}")]
    SessionNotFound(String),

    /// Failed to parse a gateway response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One display line handed to the gateway's hosted checkout page.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutLineItem {
    pub name: String,
    /// Unit amount in minor currency units.
    pub amount: i64,
    pub quantity: u32,
}

/// Request body for creating a checkout session.
#[derive(Debug, Serialize)]
pub struct CreateSessionRequest {
    /// Client-generated unique order reference.
    pub order_number: String,
    pub line_items: Vec<CheckoutLineItem>,
    /// Discount applied to the order total, in minor units.
    pub discount_amount: i64,
    /// Shipping cost in minor units.
    pub shipping_cost: i64,
    pub success_url: String,
    pub cancel_url: String,
    /// Opaque metadata echoed back on verification and webhooks.
    pub metadata: serde_json::Value,
}

/// A created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted checkout page to redirect the shopper to.
    pub url: String,
}

/// Payment state of a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    Expired,
}

/// Verification view of a checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStatus {
    pub id: String,
    pub order_number: String,
    pub payment_status: PaymentStatus,
    /// Metadata supplied at session creation, echoed verbatim.
    pub metadata: serde_json::Value,
}

/// Payment gateway API client.
#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    api_url: String,
}

impl PaymentClient {
    /// Create a new payment gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PaymentError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a checkout session for an order.
    ///
    /// # Errors
    ///
    /// Returns error if the gateway rejects the request or cannot be
    /// reached.
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.api_url);

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }

    /// Fetch the verification view of a checkout session.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::SessionNotFound` for unknown ids, or other
    /// variants if the gateway cannot be reached.
    pub async fn get_session(&self, session_id: &str) -> Result<SessionStatus, PaymentError> {
        let url = format!("{}/v1/checkout/sessions/{session_id}", self.api_url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentError::SessionNotFound(session_id.to_owned()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }
}
