//! Recently-viewed route handlers.
//!
//! Device-local only: the list lives in the session, capped at eight ids,
//! most recent first. Sign-in does not merge it.

use axum::Json;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use seesaw_core::ProductId;

use crate::error::Result;
use crate::sync::local::{recently_viewed, record_view};

/// Recently-viewed payload.
#[derive(Debug, Serialize)]
pub struct RecentlyViewedResponse {
    pub items: Vec<ProductId>,
}

/// Record request body.
#[derive(Debug, Deserialize)]
pub struct RecordViewRequest {
    pub product_id: ProductId,
}

/// The device's recently-viewed products, most recent first.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<RecentlyViewedResponse>> {
    let items = recently_viewed(&session).await;
    Ok(Json(RecentlyViewedResponse { items }))
}

/// Record a product view.
#[instrument(skip(session, form))]
pub async fn record(
    session: Session,
    Json(form): Json<RecordViewRequest>,
) -> Result<Json<RecentlyViewedResponse>> {
    record_view(&session, form.product_id).await?;
    let items = recently_viewed(&session).await;
    Ok(Json(RecentlyViewedResponse { items }))
}
