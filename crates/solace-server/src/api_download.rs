//! Download endpoint for synthesized reply audio.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Handler for `GET /download/{filename}`.
///
/// Serves a previously stored reply as an `audio/mpeg` attachment.
pub async fn download_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = state
        .pipeline
        .artifacts()
        .resolve(&filename)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid filename: {filename}")))?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("no stored audio named {filename}"))
        } else {
            ApiError::InternalServerError(format!("failed to read stored audio: {e}"))
        }
    })?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                solace_turn::synthesize::ARTIFACT_CONTENT_TYPE.to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
