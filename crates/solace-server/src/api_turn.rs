//! Turn endpoint: decodes the transport payload and invokes the pipeline.
//!
//! `POST /api/therapy` accepts either `multipart/form-data` (named binary
//! fields `audio` or `image`) or a JSON body `{message, face_image?}`.
//! Everything past decoding belongs to the pipeline.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use solace_turn::{detect_request, ChatPayload, TurnError};
use solace_types::TurnResult;
use std::sync::Arc;

/// Handler for `POST /api/therapy`.
pub async fn therapy_handler(
    Extension(state): Extension<Arc<AppState>>,
    request: Request,
) -> Result<Json<TurnResult>, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let turn = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("multipart error: {e}")))?;
        decode_multipart(multipart).await?
    } else if content_type.starts_with("application/json") {
        let Json(payload) = Json::<ChatPayload>::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
        detect_request(None, Some(payload), None)?
    } else {
        return Err(TurnError::NoUsableInput.into());
    };

    let result = state.pipeline.process(turn).await?;
    Ok(Json(result))
}

/// Reads the `audio` / `image` fields out of a multipart body.
async fn decode_multipart(
    mut multipart: Multipart,
) -> Result<solace_types::TurnRequest, ApiError> {
    let mut audio: Option<(String, Vec<u8>)> = None;
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
                audio = Some((filename, bytes.to_vec()));
            }
            "image" if !filename.is_empty() => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
                image = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    Ok(detect_request(audio, None, image)?)
}
