//! Integration tests for the coupon validation contract.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront server running (cargo run -p seesaw-storefront)
//! - The `WELCOME10` seed coupon (`sw-cli seed coupons -f seeds/coupons.yaml`)
//!
//! Run with: cargo test -p seesaw-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use seesaw_integration_tests::{session_client, storefront_base_url};

#[tokio::test]
#[ignore = "Requires running storefront, database, and seeded coupons"]
async fn test_validate_known_code_case_insensitively() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/api/coupons/validate"))
        .json(&json!({ "code": "welcome10", "subtotal": 500_000 }))
        .send()
        .await
        .expect("Failed to validate coupon");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["valid"], true);
    assert_eq!(body["coupon"]["code"], "WELCOME10");
    assert_eq!(body["discount_amount"], 50_000);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_validate_unknown_code_is_400_with_error() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/api/coupons/validate"))
        .json(&json!({ "code": "NO-SUCH-CODE", "subtotal": 500_000 }))
        .send()
        .await
        .expect("Failed to validate coupon");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(body["error"].is_string());
}
