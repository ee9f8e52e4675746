//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use seesaw_core::ProductId;
use seesaw_core::wishlist::{WishlistAction, WishlistState};

use crate::db::WishlistRepository;
use crate::error::Result;
use crate::middleware::CurrentIdentity;
use crate::services::auth::Identity;
use crate::services::sync::{current_wishlist, save_anonymous_wishlist};
use crate::state::AppState;

/// Wishlist payload returned by every wishlist endpoint.
#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub items: Vec<ProductId>,
}

/// Toggle request body.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub product_id: ProductId,
}

/// Toggle response: the new list plus whether the product ended up in it.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub items: Vec<ProductId>,
    pub wishlisted: bool,
}

/// Current wishlist for the resolved identity.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<WishlistResponse>> {
    let items = current_wishlist(&state, &session, identity).await?;
    Ok(Json(WishlistResponse { items }))
}

/// Toggle a product: add if absent, remove if present.
#[instrument(skip(state, session, form))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
    Json(form): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>> {
    let ids = current_wishlist(&state, &session, identity).await?;
    let mut wishlist = WishlistState::from_ids(ids);
    wishlist.apply(WishlistAction::Toggle(form.product_id.clone()));
    let wishlisted = wishlist.contains(&form.product_id);

    match identity {
        Identity::Anonymous => save_anonymous_wishlist(&session, wishlist.ids()).await?,
        Identity::Authenticated(user_id) => {
            let _guard = state.merge_locks().lock(user_id).await;
            let repo = WishlistRepository::new(state.pool());
            if wishlisted {
                repo.add(user_id, &form.product_id).await?;
            } else {
                repo.remove(user_id, &form.product_id).await?;
            }
        }
    }

    Ok(Json(ToggleResponse {
        items: wishlist.into_ids(),
        wishlisted,
    }))
}

/// Remove a product from the wishlist. No-op if absent.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistResponse>> {
    let ids = current_wishlist(&state, &session, identity).await?;
    let mut wishlist = WishlistState::from_ids(ids);
    wishlist.apply(WishlistAction::Remove(product_id.clone()));

    match identity {
        Identity::Anonymous => save_anonymous_wishlist(&session, wishlist.ids()).await?,
        Identity::Authenticated(user_id) => {
            let _guard = state.merge_locks().lock(user_id).await;
            WishlistRepository::new(state.pool())
                .remove(user_id, &product_id)
                .await?;
        }
    }

    Ok(Json(WishlistResponse {
        items: wishlist.into_ids(),
    }))
}
