//! Sync route handler.
//!
//! The frontend calls this right after a sign-in or sign-out so the merge
//! runs eagerly and the response carries the post-transition state. The
//! same transition also runs lazily on any cart or wishlist request, so a
//! frontend that forgets to call this only delays the merge, never loses
//! it.

use axum::{Json, extract::State};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use seesaw_core::{CartLine, ProductId};

use crate::error::Result;
use crate::middleware::CurrentIdentity;
use crate::services::sync::{current_cart, current_wishlist};
use crate::state::AppState;

/// Post-sync state of both collections.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub cart: Vec<CartLine>,
    pub wishlist: Vec<ProductId>,
}

/// Run any pending identity transition and return the active collections.
#[instrument(skip(state, session))]
pub async fn run(
    State(state): State<AppState>,
    session: Session,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<SyncResponse>> {
    // current_cart applies the transition; current_wishlist then sees the
    // already-recorded identity and just loads.
    let cart = current_cart(&state, &session, identity).await?;
    let wishlist = current_wishlist(&state, &session, identity).await?;

    Ok(Json(SyncResponse { cart, wishlist }))
}
