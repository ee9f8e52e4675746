//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//!
//! # Cart (JSON)
//! GET    /api/cart                - Current cart for the resolved identity
//! DELETE /api/cart                - Clear cart
//! POST   /api/cart/items          - Add line (additive on same variant)
//! PATCH  /api/cart/items          - Set line quantity (0 removes)
//! DELETE /api/cart/items          - Remove line
//!
//! # Wishlist (JSON)
//! GET    /api/wishlist            - Current wishlist
//! POST   /api/wishlist/toggle     - Toggle a product
//! DELETE /api/wishlist/{product_id} - Remove a product
//!
//! # Sync
//! POST /api/sync                  - Run any pending identity transition
//!                                   (called by the frontend after sign-in
//!                                   or sign-out; also runs lazily on any
//!                                   cart/wishlist request)
//!
//! # Coupons
//! POST /api/coupons/validate      - Validate a code against a subtotal
//!
//! # Recently viewed
//! GET  /api/recently-viewed       - Device-local view history
//! POST /api/recently-viewed       - Record a product view
//!
//! # Checkout
//! POST /api/checkout              - Create a gateway checkout session
//! GET  /api/orders/{order_number} - Confirmed-order lookup
//! GET  /checkout/confirm          - Verify payment, write the order
//!
//! # Webhooks
//! POST /webhooks/payments         - Gateway events (order write, shipping)
//! ```

pub mod cart;
pub mod checkout;
pub mod coupons;
pub mod recently_viewed;
pub mod sync;
pub mod webhooks;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::middleware::coupon_rate_limiter;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route(
            "/items",
            post(cart::add).patch(cart::update).delete(cart::remove),
        )
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/{product_id}", delete(wishlist::remove))
}

/// Create the coupon routes router (rate limited: codes are guessable).
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/validate", post(coupons::validate))
        .route_layer(coupon_rate_limiter())
}

/// Create the recently-viewed routes router.
pub fn recently_viewed_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(recently_viewed::show).post(recently_viewed::record),
    )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
        .nest("/api/coupons", coupon_routes())
        .nest("/api/recently-viewed", recently_viewed_routes())
        .route("/api/sync", post(sync::run))
        .route("/api/checkout", post(checkout::start))
        .route("/api/orders/{order_number}", get(checkout::show_order))
        .route("/checkout/confirm", get(checkout::confirm))
        .route("/webhooks/payments", post(webhooks::payments))
}
