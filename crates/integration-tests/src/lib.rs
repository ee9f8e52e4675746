//! Integration tests for Seesaw.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! cargo run -p seesaw-cli -- migrate
//!
//! # Start the storefront
//! cargo run -p seesaw-storefront
//!
//! # Run the ignored live-server tests
//! cargo test -p seesaw-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_cart` - Cart API and anonymous/authenticated sync
//! - `storefront_coupons` - Coupon validation contract
//!
//! The tests are `#[ignore]`d by default because they require a running
//! storefront with its database; CI runs them behind a live-stack gate.

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Create an HTTP client with a cookie store, so the session (and with it
/// the anonymous cart) persists across requests like a browser's would.
///
/// # Panics
///
/// Panics if the client cannot be built; tests cannot proceed without one.
#[must_use]
pub fn session_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
