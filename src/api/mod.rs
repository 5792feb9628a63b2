//! REST API module.
//!
//! Thin handlers over the sync orchestrator. Every successful response uses
//! the `{ success, data }` envelope; errors use `ErrorResponse`.

mod backup;
mod cards;
mod journal;
mod views;

pub use backup::*;
pub use cards::*;
pub use journal::*;
pub use views::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Body returned by delete endpoints.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}
