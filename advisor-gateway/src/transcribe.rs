use crate::app::AppState;
use crate::error::ApiError;
use crate::files::read_file_part;
use advisor_core::audio::AudioClip;
use advisor_providers::{parse, runtime, transcribe as stt};
use axum::Json;
use axum::extract::{Multipart, State};
use serde_json::{Value, json};

/// Forwards a recorded clip to the hosted speech-to-text service and answers
/// with plain text.
pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let Some(part) = read_file_part(&mut multipart).await? else {
        return Err(ApiError::bad_request("No file"));
    };

    let clip = AudioClip {
        filename: part.filename,
        mime_type: part.mime_type,
        bytes: part.bytes,
    };

    let req = stt::build_transcription(&state.cfg, &clip);
    let resp = runtime::execute(&req)
        .await
        .map_err(|e| ApiError::from_transport("Transcription failed", e))?;
    if !resp.is_success() {
        return Err(ApiError::upstream(
            "Transcription failed",
            parse::error_detail(&resp.body),
        ));
    }

    let text = parse::parse_transcription(&resp.body)
        .map_err(|e| ApiError::from_transport("Transcription failed", e))?;
    Ok(Json(json!({ "text": text })))
}
