//! Synchronization between the device-local store and the per-user remote
//! store.
//!
//! Cart and wishlist share one engine: both are collections with a keyed
//! upsert, so the merge protocol is written once and instantiated twice
//! ([`local`] provides the session-backed stores, [`remote`] the
//! database-backed ones).
//!
//! # State machine
//!
//! `Unresolved -> Anonymous -> Authenticated`, or `Unresolved ->
//! Authenticated` directly. Sign-out is `Authenticated -> Anonymous`.
//! Transitions are edge-triggered: the engine acts once per observed
//! identity change and never re-runs a merge while the identity is stable.
//!
//! The only transition with real logic is into `Authenticated`:
//!
//! 1. Load the remote collection for the now-known user.
//! 2. Read the local collection; upsert each entry into the remote store.
//!    Cart lines are written verbatim, so a variant present on both sides
//!    ends up with the local quantity. Wishlist upserts are set-union.
//! 3. Clear the local store.
//! 4. Re-load the remote collection fully and publish it as the final
//!    state, guarding against partial or racing writes during step 2.
//!
//! Any remote failure aborts before step 3, so local data is never lost to
//! a half-finished merge; the engine stays in its previous state and the
//! next observation retries.
//!
//! Sign-out does not reverse-merge: the remote store stays authoritative
//! for the account, and the (now empty) local store becomes the active one.

use std::time::Duration;

use thiserror::Error;

use seesaw_core::UserId;

use crate::db::RepositoryError;

pub mod local;
pub mod remote;

/// Upper bound on each remote call inside a merge. On expiry the merge
/// aborts with the local store intact.
const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors produced by the sync engine and its stores.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote store operation failed.
    #[error("remote store error: {0}")]
    Remote(#[from] RepositoryError),

    /// Session (local store) operation failed.
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A remote call exceeded the merge deadline.
    #[error("timed out waiting for the remote store")]
    Timeout,
}

/// Where the engine currently sources truth from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Identity has never been observed; neither store is active yet.
    Unresolved,
    /// The local store is authoritative.
    Anonymous,
    /// The remote store for this user is authoritative.
    Authenticated(UserId),
}

/// Device-scoped store for one collection.
pub trait LocalStore {
    type Item;

    /// Load the collection. Malformed persisted state fails closed to the
    /// empty collection; this method cannot error.
    fn load(&self) -> impl Future<Output = Vec<Self::Item>> + Send;

    /// Replace the stored collection.
    fn save(&self, items: &[Self::Item]) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Remove the stored collection.
    fn clear(&self) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// Per-user remote store for the same collection.
pub trait RemoteStore {
    type Item;

    /// Load the user's collection.
    fn load(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Self::Item>, SyncError>> + Send;

    /// Upsert one entry verbatim: replace on cart-line conflicts, no-op on
    /// wishlist duplicates.
    fn upsert(
        &self,
        user_id: UserId,
        item: &Self::Item,
    ) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// The merge/sync engine for one collection.
pub struct SyncEngine<L, R> {
    local: L,
    remote: R,
    state: SyncState,
}

impl<T, L, R> SyncEngine<L, R>
where
    T: Clone + Send + Sync,
    L: LocalStore<Item = T> + Sync,
    R: RemoteStore<Item = T> + Sync,
{
    /// Create an engine that has not yet observed an identity.
    pub const fn new(local: L, remote: R) -> Self {
        Self {
            local,
            remote,
            state: SyncState::Unresolved,
        }
    }

    /// Re-hydrate an engine from a previously recorded state, e.g. the
    /// session's last-observed identity.
    pub const fn resume(local: L, remote: R, state: SyncState) -> Self {
        Self {
            local,
            remote,
            state,
        }
    }

    /// The engine's current state.
    #[must_use]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// Observe the currently resolved identity.
    ///
    /// Returns `Some(collection)` when an identity transition published new
    /// state, `None` when the identity is unchanged (level, not edge).
    ///
    /// # Errors
    ///
    /// Returns the underlying store error. The engine state is unchanged on
    /// error, so the transition re-runs on the next observation.
    pub async fn observe(
        &mut self,
        identity: Option<UserId>,
    ) -> Result<Option<Vec<T>>, SyncError> {
        let next = identity.map_or(SyncState::Anonymous, SyncState::Authenticated);
        if next == self.state {
            return Ok(None);
        }

        let published = match next {
            SyncState::Authenticated(user_id) => self.merge(user_id).await?,
            // Sign-out (or first resolution as anonymous): the local store
            // becomes the active one as-is. No reverse merge.
            SyncState::Anonymous | SyncState::Unresolved => self.local.load().await,
        };

        self.state = next;
        Ok(Some(published))
    }

    /// Merge the local collection into the remote store for `user_id` and
    /// return the post-merge remote collection.
    async fn merge(&mut self, user_id: UserId) -> Result<Vec<T>, SyncError> {
        let remote = bounded(self.remote.load(user_id)).await?;

        let local = self.local.load().await;
        if local.is_empty() {
            // Nothing to sweep; the remote collection is already final.
            return Ok(remote);
        }

        for item in &local {
            bounded(self.remote.upsert(user_id, item)).await?;
        }

        // Only after every upsert landed is it safe to drop the local copy.
        self.local.clear().await?;

        bounded(self.remote.load(user_id)).await
    }
}

/// Bound a remote-store future by the merge deadline.
async fn bounded<F, O>(fut: F) -> Result<O, SyncError>
where
    F: Future<Output = Result<O, SyncError>>,
{
    tokio::time::timeout(REMOTE_TIMEOUT, fut)
        .await
        .map_err(|_| SyncError::Timeout)?
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use uuid::Uuid;

    use seesaw_core::{CartLine, ProductId, UserId};

    use super::*;

    fn line(product: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            name: "Boxy Tee".to_owned(),
            price: 120_000,
            size: "M".to_owned(),
            color: "black".to_owned(),
            quantity,
            image_url: None,
        }
    }

    /// In-memory local store fake.
    struct MemLocal<T> {
        items: Mutex<Vec<T>>,
    }

    impl<T> Default for MemLocal<T> {
        fn default() -> Self {
            Self {
                items: Mutex::new(Vec::new()),
            }
        }
    }

    impl<T: Clone + Send + Sync> LocalStore for MemLocal<T> {
        type Item = T;

        async fn load(&self) -> Vec<T> {
            self.items.lock().unwrap().clone()
        }

        async fn save(&self, items: &[T]) -> Result<(), SyncError> {
            *self.items.lock().unwrap() = items.to_vec();
            Ok(())
        }

        async fn clear(&self) -> Result<(), SyncError> {
            self.items.lock().unwrap().clear();
            Ok(())
        }
    }

    /// In-memory remote cart fake with replace-quantity upsert semantics.
    #[derive(Default)]
    struct MemRemoteCart {
        lines: Mutex<Vec<CartLine>>,
    }

    impl RemoteStore for MemRemoteCart {
        type Item = CartLine;

        async fn load(&self, _user_id: UserId) -> Result<Vec<CartLine>, SyncError> {
            Ok(self.lines.lock().unwrap().clone())
        }

        async fn upsert(&self, _user_id: UserId, item: &CartLine) -> Result<(), SyncError> {
            let mut lines = self.lines.lock().unwrap();
            if let Some(existing) = lines.iter_mut().find(|l| l.matches(&item.key())) {
                *existing = item.clone();
            } else {
                lines.push(item.clone());
            }
            Ok(())
        }
    }

    /// In-memory remote wishlist fake with set-union upsert semantics.
    #[derive(Default)]
    struct MemRemoteWishlist {
        ids: Mutex<Vec<ProductId>>,
    }

    impl RemoteStore for MemRemoteWishlist {
        type Item = ProductId;

        async fn load(&self, _user_id: UserId) -> Result<Vec<ProductId>, SyncError> {
            Ok(self.ids.lock().unwrap().clone())
        }

        async fn upsert(&self, _user_id: UserId, item: &ProductId) -> Result<(), SyncError> {
            let mut ids = self.ids.lock().unwrap();
            if !ids.contains(item) {
                ids.push(item.clone());
            }
            Ok(())
        }
    }

    fn user() -> UserId {
        UserId::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_unresolved_to_anonymous_publishes_local() {
        let local = MemLocal::default();
        local.save(&[line("tee-1", 2)]).await.unwrap();

        let mut engine = SyncEngine::new(local, MemRemoteCart::default());
        let published = engine.observe(None).await.unwrap().unwrap();

        assert_eq!(published, vec![line("tee-1", 2)]);
        assert_eq!(engine.state(), SyncState::Anonymous);
    }

    #[tokio::test]
    async fn test_observe_is_edge_triggered() {
        let mut engine = SyncEngine::new(
            MemLocal::<CartLine>::default(),
            MemRemoteCart::default(),
        );

        assert!(engine.observe(None).await.unwrap().is_some());
        // Same identity again: level, not edge.
        assert!(engine.observe(None).await.unwrap().is_none());
        assert!(engine.observe(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_local_quantity_overwrites_remote() {
        let user_id = user();
        let local = MemLocal::default();
        local.save(&[line("A", 2)]).await.unwrap();

        let remote = MemRemoteCart::default();
        remote.upsert(user_id, &line("A", 5)).await.unwrap();

        let mut engine = SyncEngine::resume(local, remote, SyncState::Anonymous);
        let published = engine.observe(Some(user_id)).await.unwrap().unwrap();

        assert_eq!(published, vec![line("A", 2)]);
        assert!(engine.local.load().await.is_empty(), "local cleared post-merge");
    }

    #[tokio::test]
    async fn test_merge_preserves_remote_only_lines() {
        let user_id = user();
        let local = MemLocal::default();
        local.save(&[line("A", 1)]).await.unwrap();

        let remote = MemRemoteCart::default();
        remote.upsert(user_id, &line("B", 3)).await.unwrap();

        let mut engine = SyncEngine::resume(local, remote, SyncState::Anonymous);
        let mut published = engine.observe(Some(user_id)).await.unwrap().unwrap();
        published.sort_by(|a, b| a.product_id.cmp(&b.product_id));

        assert_eq!(published, vec![line("A", 1), line("B", 3)]);
    }

    #[tokio::test]
    async fn test_merge_twice_is_idempotent() {
        let user_id = user();
        let local = MemLocal::default();
        local.save(&[line("A", 2)]).await.unwrap();

        let mut engine =
            SyncEngine::resume(local, MemRemoteCart::default(), SyncState::Anonymous);
        let first = engine.observe(Some(user_id)).await.unwrap().unwrap();

        // Sign out and back in: local is empty now, so the second merge
        // must leave the remote collection exactly as the first run did.
        engine.observe(None).await.unwrap();
        let second = engine.observe(Some(user_id)).await.unwrap().unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sign_out_does_not_reverse_merge() {
        let user_id = user();
        let local = MemLocal::default();
        local.save(&[line("A", 2)]).await.unwrap();

        let mut engine =
            SyncEngine::resume(local, MemRemoteCart::default(), SyncState::Anonymous);
        engine.observe(Some(user_id)).await.unwrap();

        let published = engine.observe(None).await.unwrap().unwrap();
        assert!(published.is_empty(), "local store re-adopted as-is");
        assert_eq!(
            engine.remote.load(user_id).await.unwrap(),
            vec![line("A", 2)],
            "remote untouched by sign-out"
        );
    }

    #[tokio::test]
    async fn test_wishlist_merge_is_set_union() {
        let user_id = user();
        let local = MemLocal::default();
        local
            .save(&[ProductId::new("tee-1"), ProductId::new("tee-2")])
            .await
            .unwrap();

        let remote = MemRemoteWishlist::default();
        remote.upsert(user_id, &ProductId::new("tee-2")).await.unwrap();
        remote.upsert(user_id, &ProductId::new("tee-3")).await.unwrap();

        let mut engine = SyncEngine::resume(local, remote, SyncState::Anonymous);
        let mut published = engine.observe(Some(user_id)).await.unwrap().unwrap();
        published.sort();

        assert_eq!(
            published,
            vec![
                ProductId::new("tee-1"),
                ProductId::new("tee-2"),
                ProductId::new("tee-3"),
            ]
        );
    }

    #[tokio::test]
    async fn test_end_to_end_anonymous_then_sign_in() {
        // Anonymous shopper adds two items.
        let local = MemLocal::default();
        let remote = MemRemoteCart::default();
        let mut engine = SyncEngine::new(local, remote);
        engine.observe(None).await.unwrap();
        engine
            .local
            .save(&[line("tee-1", 1), line("tee-2", 2)])
            .await
            .unwrap();

        // Sign-in merges both items server-side and clears the device.
        let user_id = user();
        let published = engine.observe(Some(user_id)).await.unwrap().unwrap();
        assert_eq!(published.len(), 2);
        assert!(engine.local.load().await.is_empty());

        // A fresh engine resumed as authenticated (a second page load)
        // sources the same two items from the remote store.
        let mut next_load = SyncEngine::resume(
            MemLocal::<CartLine>::default(),
            engine.remote,
            SyncState::Authenticated(user_id),
        );
        assert!(next_load.observe(Some(user_id)).await.unwrap().is_none());
        let remote_lines = next_load.remote.load(user_id).await.unwrap();
        assert_eq!(remote_lines.len(), 2);
    }
}
