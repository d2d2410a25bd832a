//! Archive listing and download handlers.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use vframe_models::ProcessedFile;

use crate::error::ApiResult;
use crate::files::FileInfo;
use crate::state::AppState;

/// Status response.
#[derive(Serialize)]
pub struct StatusResponse {
    pub files: Vec<ProcessedFile>,
    pub total: usize,
}

/// Processed archives with download links.
pub async fn get_status(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let files = state.files.list_processed().await?;
    Ok(Json(StatusResponse {
        total: files.len(),
        files,
    }))
}

/// Plain `{name, size}` listing of archives.
pub async fn list_files(State(state): State<AppState>) -> ApiResult<Json<Vec<FileInfo>>> {
    Ok(Json(state.files.list_files().await?))
}

/// Serve an archive from the output directory.
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let path = state.files.resolve_download(&filename).await?;
    let bytes = tokio::fs::read(&path).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(bytes),
    )
        .into_response())
}
