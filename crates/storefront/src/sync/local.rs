//! Session-backed local stores.
//!
//! The tower-session is the device-scoped persistent slot: each collection
//! lives under a fixed namespaced key as a JSON array. Reads fail closed -
//! a malformed stored value is logged and treated as the empty collection,
//! never surfaced to the caller.

use tower_sessions::Session;

use seesaw_core::{CartLine, ProductId};

use crate::models::session::keys;

use super::{LocalStore, SyncError};

/// Most-recent-first cap on the recently-viewed list.
const RECENTLY_VIEWED_CAP: usize = 8;

/// Load a JSON collection from the session, failing closed on malformed
/// state.
async fn load_or_empty<T>(session: &Session, key: &str) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    match session.get::<Vec<T>>(key).await {
        Ok(Some(items)) => items,
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(key, "malformed session state, treating as empty: {e}");
            Vec::new()
        }
    }
}

/// Session-backed cart store (`seesaw-cart`).
#[derive(Clone)]
pub struct SessionCartStore {
    session: Session,
}

impl SessionCartStore {
    /// Wrap a session as the local cart store.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl LocalStore for SessionCartStore {
    type Item = CartLine;

    async fn load(&self) -> Vec<CartLine> {
        load_or_empty(&self.session, keys::CART).await
    }

    async fn save(&self, items: &[CartLine]) -> Result<(), SyncError> {
        self.session.insert(keys::CART, items).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SyncError> {
        self.session.remove::<Vec<CartLine>>(keys::CART).await?;
        Ok(())
    }
}

/// Session-backed wishlist store (`seesaw-wishlist`).
#[derive(Clone)]
pub struct SessionWishlistStore {
    session: Session,
}

impl SessionWishlistStore {
    /// Wrap a session as the local wishlist store.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl LocalStore for SessionWishlistStore {
    type Item = ProductId;

    async fn load(&self) -> Vec<ProductId> {
        load_or_empty(&self.session, keys::WISHLIST).await
    }

    async fn save(&self, items: &[ProductId]) -> Result<(), SyncError> {
        self.session.insert(keys::WISHLIST, items).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SyncError> {
        self.session.remove::<Vec<ProductId>>(keys::WISHLIST).await?;
        Ok(())
    }
}

/// Load the recently-viewed product ids, most recent first.
pub async fn recently_viewed(session: &Session) -> Vec<ProductId> {
    load_or_empty(session, keys::RECENTLY_VIEWED).await
}

/// Record a product view: moves (or inserts) the id to the front and trims
/// to the cap. Device-local only; never merged on sign-in.
///
/// # Errors
///
/// Returns a session error if the updated list cannot be stored.
pub async fn record_view(session: &Session, product_id: ProductId) -> Result<(), SyncError> {
    let mut ids = recently_viewed(session).await;
    ids.retain(|existing| existing != &product_id);
    ids.insert(0, product_id);
    ids.truncate(RECENTLY_VIEWED_CAP);

    session.insert(keys::RECENTLY_VIEWED, &ids).await?;
    Ok(())
}
