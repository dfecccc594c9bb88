//! Submission API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::{AppError, AppErrorWithVersion};
use crate::models::{SubmitRequest, Submission};
use crate::AppState;

/// POST /api/submit - Submit a new site for review.
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<Submission> {
    let index_version = state.moderation.index_version().await;

    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => {
            return error(
                AppError::BadRequest(format!("Invalid submission body: {}", rejection.body_text())),
                index_version,
            )
        }
    };

    match state.moderation.submit(request).await {
        Ok(record) => success(record, index_version),
        Err(e) => error(e, index_version),
    }
}

/// GET /api/submissions - List all pending (non-rejected) submissions.
///
/// Returns a bare JSON array rather than an envelope.
pub async fn list_submissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Submission>>, AppErrorWithVersion> {
    match state.moderation.list().await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            tracing::error!("Failed to list submissions: {}", e);
            Err(AppErrorWithVersion {
                error: e,
                index_version: state.moderation.index_version().await,
            })
        }
    }
}

/// GET /api/submissions/:id - Get a single submission, including rejected ones.
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Submission> {
    let index_version = state.moderation.index_version().await;

    match state.moderation.get(&id).await {
        Ok(record) => success(record, index_version),
        Err(e) => error(e, index_version),
    }
}
