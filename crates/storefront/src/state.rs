//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::{Mutex, OwnedMutexGuard};

use seesaw_core::UserId;

use crate::config::StorefrontConfig;
use crate::services::auth::AuthClient;
use crate::services::payments::{PaymentClient, PaymentError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    auth: AuthClient,
    payments: PaymentClient,
    merge_locks: MergeLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the payment gateway client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, PaymentError> {
        let auth = AuthClient::new(&config.auth);
        let payments = PaymentClient::new(&config.payments)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                auth,
                payments,
                merge_locks: MergeLocks::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the auth provider client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.inner.payments
    }

    /// Get a reference to the per-user merge locks.
    #[must_use]
    pub fn merge_locks(&self) -> &MergeLocks {
        &self.inner.merge_locks
    }
}

/// Per-user serialization of merges and remote cart mutations.
///
/// The sign-in merge must run to completion before any other cart or
/// wishlist mutation for the same user is accepted; a mutation racing the
/// merge could be lost to the step-4 reload or duplicated by the sweep.
/// Handlers take the user's lock for the duration of a merge or a remote
/// mutation.
#[derive(Clone)]
pub struct MergeLocks {
    locks: moka::sync::Cache<uuid::Uuid, Arc<Mutex<()>>>,
}

impl MergeLocks {
    /// Lock entries idle this long are dropped.
    const IDLE_TTL: Duration = Duration::from_secs(3600);

    fn new() -> Self {
        // Eviction can only race if a lock has been held idle for the full
        // TTL, which no merge or mutation approaches.
        let locks = moka::sync::Cache::builder()
            .max_capacity(100_000)
            .time_to_idle(Self::IDLE_TTL)
            .build();

        Self { locks }
    }

    /// Acquire the lock for a user, waiting behind any in-flight merge or
    /// mutation.
    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .get_with(user_id.as_uuid(), || Arc::new(Mutex::new(())));
        mutex.lock_owned().await
    }
}
