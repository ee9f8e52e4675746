//! Database-backed remote stores.
//!
//! Thin adapters from the repository layer to the [`RemoteStore`] trait the
//! sync engine consumes. The upsert semantics the merge relies on live in
//! the repositories: cart upserts replace the stored quantity, wishlist
//! adds are no-ops on duplicates.

use sqlx::PgPool;

use seesaw_core::{CartLine, ProductId, UserId};

use crate::db::{CartRepository, WishlistRepository};

use super::{RemoteStore, SyncError};

/// Per-user cart store over the `carts` table.
#[derive(Clone)]
pub struct RemoteCartStore {
    pool: PgPool,
}

impl RemoteCartStore {
    /// Wrap a connection pool as the remote cart store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RemoteStore for RemoteCartStore {
    type Item = CartLine;

    async fn load(&self, user_id: UserId) -> Result<Vec<CartLine>, SyncError> {
        Ok(CartRepository::new(&self.pool).load(user_id).await?)
    }

    async fn upsert(&self, user_id: UserId, item: &CartLine) -> Result<(), SyncError> {
        Ok(CartRepository::new(&self.pool)
            .upsert_line(user_id, item)
            .await?)
    }
}

/// Per-user wishlist store over the `wishlists` table.
#[derive(Clone)]
pub struct RemoteWishlistStore {
    pool: PgPool,
}

impl RemoteWishlistStore {
    /// Wrap a connection pool as the remote wishlist store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RemoteStore for RemoteWishlistStore {
    type Item = ProductId;

    async fn load(&self, user_id: UserId) -> Result<Vec<ProductId>, SyncError> {
        Ok(WishlistRepository::new(&self.pool).load(user_id).await?)
    }

    async fn upsert(&self, user_id: UserId, item: &ProductId) -> Result<(), SyncError> {
        Ok(WishlistRepository::new(&self.pool).add(user_id, item).await?)
    }
}
