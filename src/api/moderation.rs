//! Moderation API endpoints.

use axum::extract::{Path, State};

use super::{error, success, ApiResult};
use crate::models::{ApproveOutcome, Submission};
use crate::AppState;

/// POST /api/approve/:id - Cast one approval vote.
pub async fn approve_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApproveOutcome> {
    match state.moderation.approve(&id).await {
        Ok(outcome) => {
            let index_version = state.moderation.index_version().await;
            success(outcome, index_version)
        }
        Err(e) => error(e, state.moderation.index_version().await),
    }
}

/// POST /api/reject/:id - Reject a submission.
pub async fn reject_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Submission> {
    let index_version = state.moderation.index_version().await;

    match state.moderation.reject(&id).await {
        Ok(record) => success(record, index_version),
        Err(e) => error(e, index_version),
    }
}
