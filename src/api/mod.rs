//! REST API module.
//!
//! Contains all API routes and handlers. Every envelope carries the canonical
//! index version so clients can tell when the directory changed.

mod moderation;
mod sites;
mod submissions;

pub use moderation::*;
pub use sites::*;
pub use submissions::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithVersion};

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub index_version: u64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, index_version: u64) -> Self {
        Self {
            success: true,
            data,
            index_version,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithVersion>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, index_version: u64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, index_version))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, index_version: u64) -> ApiResult<T> {
    Err(AppErrorWithVersion {
        error: err,
        index_version,
    })
}
