//! Identity resolution against the external auth provider.
//!
//! The storefront never authenticates shoppers itself. The frontend obtains
//! a bearer token from the auth provider; this module verifies it against
//! the provider's user-info endpoint and reduces the result to a single
//! identity signal: anonymous, or a user id.
//!
//! A provider outage is distinct from "no token": resolution fails instead
//! of defaulting to anonymous, so the sync engine never runs a merge (or
//! re-adopts the session store) on a guess.

use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use seesaw_core::UserId;

use crate::config::AuthConfig;

/// How long a verified token is trusted without re-contacting the provider.
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(60);

/// Upper bound on concurrently cached tokens.
const TOKEN_CACHE_CAPACITY: u64 = 10_000;

/// The resolved identity of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated(UserId),
}

impl Identity {
    /// The user id, if authenticated.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user_id) => Some(*user_id),
        }
    }
}

/// Errors that can occur while resolving an identity.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an unexpected response.
    #[error("Auth provider error: {status}")]
    Api { status: u16 },

    /// Failed to parse the provider response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// User-info payload returned by the auth provider.
#[derive(Debug, Deserialize)]
struct UserInfo {
    id: Uuid,
}

/// Client for the external auth provider's verification endpoint.
#[derive(Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    api_url: String,
    // token -> verified user id
    cache: Cache<String, UserId>,
}

impl AuthClient {
    /// Create a new auth provider client.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(TOKEN_CACHE_CAPACITY)
            .time_to_live(TOKEN_CACHE_TTL)
            .build();

        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            cache,
        }
    }

    /// Resolve an optional bearer token to an identity.
    ///
    /// No token, or a token the provider rejects, resolves to
    /// [`Identity::Anonymous`].
    ///
    /// # Errors
    ///
    /// Returns an error when the provider cannot be reached or answers with
    /// an unexpected status; the identity is then unresolved, not anonymous.
    pub async fn resolve(&self, bearer: Option<&str>) -> Result<Identity, AuthError> {
        let Some(token) = bearer else {
            return Ok(Identity::Anonymous);
        };

        if let Some(user_id) = self.cache.get(token).await {
            return Ok(Identity::Authenticated(user_id));
        }

        let url = format!("{}/v1/user", self.api_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // Expired or revoked token: the shopper is simply anonymous.
            return Ok(Identity::Anonymous);
        }

        if !status.is_success() {
            return Err(AuthError::Api {
                status: status.as_u16(),
            });
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;

        let user_id = UserId::new(info.id);
        self.cache.insert(token.to_owned(), user_id).await;

        Ok(Identity::Authenticated(user_id))
    }
}
