//! HTTP handlers

use super::error::ApiError;
use crate::server::state::AppState;
use crate::types::{DownloadRequest, DownloadResponse, JobId, StatusResponse};
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

/// Landing page
pub async fn index() -> impl IntoResponse {
    "tubefetch"
}

/// Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /api/download`
pub async fn start_download(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DownloadRequest>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let response = state.jobs.submit(&request).await?;
    Ok(Json(response))
}

/// `GET /api/status/{download_id}`
///
/// An id that can never name a job reads as `processing`, like any unknown
/// id, without touching the filesystem.
pub async fn check_status(
    State(state): State<Arc<AppState>>,
    Path(download_id): Path<String>,
) -> Json<StatusResponse> {
    match download_id.parse::<JobId>() {
        Ok(id) => Json(state.jobs.status(&id).await),
        Err(_) => {
            debug!(%download_id, "status requested for malformed id");
            Json(StatusResponse::processing())
        }
    }
}

/// `GET /api/download/{download_id}`: stream the finished file
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(download_id): Path<String>,
) -> Result<Response, ApiError> {
    let id: JobId = download_id.parse().map_err(|_| ApiError::not_found())?;
    let output = state.jobs.output(&id).await?;

    let file = tokio::fs::File::open(&output.path).await.map_err(|e| {
        error!(%id, path = %output.path.display(), error = %e, "could not open output");
        ApiError::not_found()
    })?;
    let size = file.metadata().await.map_err(crate::error::TubeFetchError::from)?.len();

    let filename = output.display_name(&id);
    info!(%id, %filename, bytes = size, "serving file");

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(output.content_type()));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)).map_err(|_| {
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: "could not build download header".into(),
            }
        })?,
    );

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}
