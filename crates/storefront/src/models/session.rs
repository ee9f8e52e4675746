//! Session-stored types.
//!
//! The session is the device-scoped local store: anonymous cart and
//! wishlist state lives here until a sign-in merges it into the per-user
//! database tables.

use serde::{Deserialize, Serialize};

use seesaw_core::UserId;

use crate::services::auth::Identity;

/// Session keys for device-local state.
pub mod keys {
    /// Anonymous cart lines (JSON array of `CartLine`).
    pub const CART: &str = "seesaw-cart";

    /// Anonymous wishlist (JSON array of product-id strings).
    pub const WISHLIST: &str = "seesaw-wishlist";

    /// Recently viewed product ids, capped, most-recent-first.
    pub const RECENTLY_VIEWED: &str = "seesaw-recently-viewed";

    /// The identity the sync engine last acted on.
    pub const LAST_IDENTITY: &str = "last_identity";
}

/// The identity last observed by the sync engine, persisted per session.
///
/// Transitions are edge-triggered: the merge runs once when the stored value
/// differs from the freshly resolved identity, never again while the value
/// matches. A session without this key has never resolved an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum LastIdentity {
    Anonymous,
    Authenticated { user_id: UserId },
}

impl From<Identity> for LastIdentity {
    fn from(identity: Identity) -> Self {
        match identity {
            Identity::Anonymous => Self::Anonymous,
            Identity::Authenticated(user_id) => Self::Authenticated { user_id },
        }
    }
}
