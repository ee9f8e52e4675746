//! Session-level sync orchestration.
//!
//! Bridges per-request identity resolution to the sync engine: the session
//! records the identity the engine last acted on, and this module replays
//! the engine against the freshly resolved identity before any cart or
//! wishlist read or write. The merge therefore happens on the first request
//! after sign-in, whichever endpoint that hits.

use tower_sessions::Session;

use seesaw_core::{CartLine, ProductId};

use crate::db::{CartRepository, WishlistRepository};
use crate::error::Result;
use crate::models::session::{LastIdentity, keys};
use crate::services::auth::Identity;
use crate::state::AppState;
use crate::sync::local::{SessionCartStore, SessionWishlistStore};
use crate::sync::remote::{RemoteCartStore, RemoteWishlistStore};
use crate::sync::{LocalStore, SyncEngine, SyncState};

/// Map the session-recorded identity to an engine state.
const fn resume_state(last: Option<LastIdentity>) -> SyncState {
    match last {
        None => SyncState::Unresolved,
        Some(LastIdentity::Anonymous) => SyncState::Anonymous,
        Some(LastIdentity::Authenticated { user_id }) => SyncState::Authenticated(user_id),
    }
}

/// Apply any pending identity transition for this session.
///
/// Edge-triggered: when the session's recorded identity matches the
/// resolved one this is a cheap no-op. On a transition, both collection
/// engines run to completion (under the user's merge lock for sign-ins)
/// before the new identity is recorded, so a failed merge re-runs on the
/// next request instead of being skipped.
///
/// # Errors
///
/// Returns the underlying store error; the session's recorded identity is
/// left unchanged in that case.
pub async fn ensure_synced(
    state: &AppState,
    session: &Session,
    identity: Identity,
) -> Result<()> {
    let last: Option<LastIdentity> = session
        .get(keys::LAST_IDENTITY)
        .await
        .ok()
        .flatten();

    let next = LastIdentity::from(identity);
    if last == Some(next) {
        return Ok(());
    }

    let prior = resume_state(last);
    let target = identity.user_id();

    // Serialize the transition against concurrent merges and remote
    // mutations for the same user.
    let _guard = match target {
        Some(user_id) => Some(state.merge_locks().lock(user_id).await),
        None => None,
    };

    let mut cart_engine = SyncEngine::resume(
        SessionCartStore::new(session.clone()),
        RemoteCartStore::new(state.pool().clone()),
        prior,
    );
    cart_engine.observe(target).await?;

    let mut wishlist_engine = SyncEngine::resume(
        SessionWishlistStore::new(session.clone()),
        RemoteWishlistStore::new(state.pool().clone()),
        prior,
    );
    wishlist_engine.observe(target).await?;

    session.insert(keys::LAST_IDENTITY, next).await?;
    Ok(())
}

/// Ensure sync has run, then load the identity's active cart.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn current_cart(
    state: &AppState,
    session: &Session,
    identity: Identity,
) -> Result<Vec<CartLine>> {
    ensure_synced(state, session, identity).await?;

    match identity {
        Identity::Anonymous => Ok(SessionCartStore::new(session.clone()).load().await),
        Identity::Authenticated(user_id) => {
            Ok(CartRepository::new(state.pool()).load(user_id).await?)
        }
    }
}

/// Ensure sync has run, then load the identity's active wishlist.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn current_wishlist(
    state: &AppState,
    session: &Session,
    identity: Identity,
) -> Result<Vec<ProductId>> {
    ensure_synced(state, session, identity).await?;

    match identity {
        Identity::Anonymous => Ok(SessionWishlistStore::new(session.clone()).load().await),
        Identity::Authenticated(user_id) => {
            Ok(WishlistRepository::new(state.pool()).load(user_id).await?)
        }
    }
}

/// Persist cart lines to the anonymous session store.
///
/// Anonymous carts replace the session blob wholesale; authenticated carts
/// are mutated per-line by the cart routes instead.
///
/// # Errors
///
/// Returns the underlying session error.
pub async fn save_anonymous_cart(session: &Session, lines: &[CartLine]) -> Result<()> {
    SessionCartStore::new(session.clone()).save(lines).await?;
    Ok(())
}

/// Persist wishlist ids to the anonymous session store.
///
/// # Errors
///
/// Returns the underlying session error.
pub async fn save_anonymous_wishlist(session: &Session, ids: &[ProductId]) -> Result<()> {
    SessionWishlistStore::new(session.clone()).save(ids).await?;
    Ok(())
}

/// Clear the identity's active cart after a confirmed checkout.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn clear_cart(state: &AppState, session: &Session, identity: Identity) -> Result<()> {
    match identity {
        Identity::Anonymous => {
            SessionCartStore::new(session.clone()).clear().await?;
        }
        Identity::Authenticated(user_id) => {
            let _guard = state.merge_locks().lock(user_id).await;
            CartRepository::new(state.pool()).clear(user_id).await?;
        }
    }
    Ok(())
}
