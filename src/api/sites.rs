//! Canonical index endpoint.

use axum::{extract::State, Json};

use crate::models::SiteIndex;
use crate::AppState;

/// GET /data/sites.json - The raw canonical index document.
pub async fn get_sites(State(state): State<AppState>) -> Json<SiteIndex> {
    Json(state.moderation.index().await)
}
