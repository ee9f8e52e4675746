//! Identity extractor.
//!
//! Resolves the `Authorization: Bearer` header to an [`Identity`] via the
//! auth provider client. Handlers take `CurrentIdentity` instead of talking
//! to the provider themselves.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;
use crate::services::auth::Identity;
use crate::state::AppState;

/// Extractor yielding the resolved identity of the request.
///
/// Anonymous requests (no token, or a rejected token) succeed with
/// [`Identity::Anonymous`]. A provider outage rejects the request: the
/// identity is unknown, and acting on a guess could trigger a spurious
/// merge.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     CurrentIdentity(identity): CurrentIdentity,
/// ) -> impl IntoResponse {
///     match identity.user_id() {
///         Some(id) => format!("user {id}"),
///         None => "guest".to_string(),
///     }
/// }
/// ```
pub struct CurrentIdentity(pub Identity);

impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        let identity = state.auth().resolve(bearer).await?;

        if let Identity::Authenticated(user_id) = identity {
            crate::error::set_sentry_user(&user_id);
        }

        Ok(Self(identity))
    }
}
