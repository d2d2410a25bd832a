//! Video upload handler.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use vframe_models::{is_video_file, ProcessingResult, VideoFile, VIDEO_EXTENSIONS};
use vframe_worker::ScratchFile;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the video.
pub const VIDEO_FIELD: &str = "video";

/// Save the `video` field, extract its frames and archive them.
///
/// Responds 200 with the result on success and 500 with the result when
/// processing fails. The saved upload is only removed on success.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ProcessingResult>)> {
    let video = save_upload(&state, &mut multipart).await?;

    info!(
        id = %video.id,
        original = %video.original_name,
        size = video.size,
        "Processing upload"
    );

    let path = std::path::Path::new(&video.path);
    let result = state.processor.process(path, &video.id).await;

    if !result.success {
        warn!(id = %video.id, "Upload processing failed: {}", result.message);
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(result)));
    }

    state.files.remove_upload(path).await;
    Ok((StatusCode::OK, Json(result)))
}

async fn save_upload(state: &AppState, multipart: &mut Multipart) -> ApiResult<VideoFile> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::bad_request("Error receiving file"))?;

        if !is_video_file(&original_name) {
            return Err(ApiError::bad_request(format!(
                "Unsupported file format. Use: {}",
                VIDEO_EXTENSIONS.join(", ")
            )));
        }

        state.files.create_dirs().await?;
        let upload = state.files.new_upload(&original_name);

        // Removed again if the body breaks off mid-stream
        let guard = ScratchFile::new(upload.path.clone());
        let mut file = tokio::fs::File::create(guard.path()).await?;
        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await? {
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        let path = guard.keep();

        return Ok(VideoFile {
            id: upload.id,
            filename: upload.filename,
            original_name,
            path: path.to_string_lossy().into_owned(),
            size,
            created_at: Utc::now(),
        });
    }

    Err(ApiError::bad_request("Error receiving file"))
}
