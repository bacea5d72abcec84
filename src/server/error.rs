//! HTTP rendering of errors

use crate::error::{ErrorCode, TubeFetchError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Error returned by handlers, rendered as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn not_found() -> Self {
        Self { status: StatusCode::NOT_FOUND, detail: "File not found".into() }
    }
}

impl From<TubeFetchError> for ApiError {
    fn from(err: TubeFetchError) -> Self {
        let status = match err.code() {
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ExtractionFailed
            | ErrorCode::FetchFailed
            | ErrorCode::MissingDependency
            | ErrorCode::InvalidConfig
            | ErrorCode::FileError
            | ErrorCode::SpawnError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, detail: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}
