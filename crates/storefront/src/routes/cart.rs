//! Cart route handlers.
//!
//! Every handler resolves the identity, lets the sync service apply any
//! pending sign-in merge, applies the action through the pure reducer, and
//! mirrors the result to the identity's active store: the session for
//! anonymous shoppers, the `carts` table for authenticated ones.
//! Authenticated mutations take the user's merge lock so they cannot
//! interleave with an in-flight merge.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use seesaw_core::cart::{CartAction, CartState};
use seesaw_core::{CartLine, ProductId, VariantKey};

use crate::db::CartRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CurrentIdentity;
use crate::services::auth::Identity;
use crate::services::sync::{clear_cart, current_cart, save_anonymous_cart};
use crate::state::AppState;

/// Cart payload returned by every cart endpoint.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLine>,
    pub total_items: u32,
    pub subtotal: i64,
    /// Whether the cart drawer should be visible (true after an add).
    pub open: bool,
}

impl CartResponse {
    fn from_state(cart: &CartState) -> Self {
        Self {
            total_items: cart.total_items(),
            subtotal: cart.subtotal(),
            open: cart.open,
            items: cart.lines().to_vec(),
        }
    }
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub name: String,
    pub price: i64,
    pub size: String,
    pub color: String,
    pub quantity: Option<u32>,
    pub image_url: Option<String>,
}

/// Update quantity request body. Quantity zero removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub quantity: u32,
}

/// Remove line request body.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
}

/// Current cart for the resolved identity.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<CartResponse>> {
    let lines = current_cart(&state, &session, identity).await?;
    Ok(Json(CartResponse::from_state(&CartState::from_lines(lines))))
}

/// Add a line to the cart.
///
/// Adding an already-present variant sums quantities; the summed line is
/// what gets mirrored to the remote store (whose upsert replaces, not
/// adds - the addition has already happened in the reducer).
#[instrument(skip(state, session, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
    Json(form): Json<AddItemRequest>,
) -> Result<Json<CartResponse>> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }

    let line = CartLine {
        product_id: form.product_id,
        name: form.name,
        price: form.price,
        size: form.size,
        color: form.color,
        quantity,
        image_url: form.image_url,
    };
    let key = line.key();

    add_breadcrumb(
        "cart",
        "Added item to cart",
        Some(&[("product_id", key.product_id.as_str())]),
    );

    let lines = current_cart(&state, &session, identity).await?;
    let mut cart = CartState::from_lines(lines);
    cart.apply(CartAction::Add(line));

    match identity {
        Identity::Anonymous => save_anonymous_cart(&session, cart.lines()).await?,
        Identity::Authenticated(user_id) => {
            let _guard = state.merge_locks().lock(user_id).await;
            if let Some(updated) = cart.lines().iter().find(|l| l.matches(&key)) {
                CartRepository::new(state.pool())
                    .upsert_line(user_id, updated)
                    .await?;
            }
        }
    }

    Ok(Json(CartResponse::from_state(&cart)))
}

/// Set a line's quantity. Quantity zero removes the line; an absent key is
/// a no-op.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
    Json(form): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>> {
    let key = VariantKey::new(form.product_id, form.size, form.color);

    let lines = current_cart(&state, &session, identity).await?;
    let mut cart = CartState::from_lines(lines);
    cart.apply(CartAction::SetQuantity(key.clone(), form.quantity));

    match identity {
        Identity::Anonymous => save_anonymous_cart(&session, cart.lines()).await?,
        Identity::Authenticated(user_id) => {
            let _guard = state.merge_locks().lock(user_id).await;
            let repo = CartRepository::new(state.pool());
            if form.quantity == 0 {
                repo.remove_line(user_id, &key).await?;
            } else {
                repo.update_quantity(user_id, &key, form.quantity).await?;
            }
        }
    }

    Ok(Json(CartResponse::from_state(&cart)))
}

/// Remove a line. An absent key is a no-op.
#[instrument(skip(state, session, form))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
    Json(form): Json<RemoveItemRequest>,
) -> Result<Json<CartResponse>> {
    let key = VariantKey::new(form.product_id, form.size, form.color);

    let lines = current_cart(&state, &session, identity).await?;
    let mut cart = CartState::from_lines(lines);
    cart.apply(CartAction::Remove(key.clone()));

    match identity {
        Identity::Anonymous => save_anonymous_cart(&session, cart.lines()).await?,
        Identity::Authenticated(user_id) => {
            let _guard = state.merge_locks().lock(user_id).await;
            CartRepository::new(state.pool())
                .remove_line(user_id, &key)
                .await?;
        }
    }

    Ok(Json(CartResponse::from_state(&cart)))
}

/// Clear the cart.
#[instrument(skip(state, session))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<CartResponse>> {
    // Apply any pending transition first so a pre-sign-in cart is not
    // resurrected by a later merge.
    let lines = current_cart(&state, &session, identity).await?;
    let mut cart = CartState::from_lines(lines);
    cart.apply(CartAction::Clear);

    clear_cart(&state, &session, identity).await?;

    Ok(Json(CartResponse::from_state(&cart)))
}
