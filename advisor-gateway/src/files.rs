use crate::app::AppState;
use crate::error::ApiError;
use advisor_providers::{files, parse, runtime};
use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::Response;
use serde_json::{Value, json};

pub(crate) struct UploadedPart {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Pulls the `file` part out of a multipart request; other parts are drained
/// and ignored.
pub(crate) async fn read_file_part(
    multipart: &mut Multipart,
) -> Result<Option<UploadedPart>, ApiError> {
    let mut file = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => return Err(ApiError::bad_request("Invalid multipart payload")),
        };

        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.bin").to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiError::bad_request("Invalid file payload"))?;
            file = Some(UploadedPart {
                filename,
                mime_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let _ = field.bytes().await;
        }
    }
    Ok(file)
}

/// Forwards an uploaded file to hosted storage and answers with the opaque
/// identifier the assistant's tool layer understands.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let Some(part) = read_file_part(&mut multipart).await? else {
        return Err(ApiError::bad_request("No file"));
    };

    log::info!("uploading {} ({} bytes)", part.filename, part.bytes.len());

    let req = files::build_upload_file(&state.cfg, &part.filename, &part.mime_type, &part.bytes);
    let resp = runtime::execute(&req)
        .await
        .map_err(|e| ApiError::from_transport("Upload failed", e))?;
    if !resp.is_success() {
        return Err(ApiError::upstream(
            "Upload failed",
            parse::error_detail(&resp.body),
        ));
    }

    let file_id = parse::parse_uploaded(&resp.body)
        .map_err(|e| ApiError::from_transport("Upload failed", e))?;
    Ok(Json(json!({ "file_id": file_id })))
}

/// Serves stored file bytes back as an attachment-disposed binary download.
pub async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let meta = runtime::execute(&files::build_retrieve_file(&state.cfg, &file_id))
        .await
        .map_err(|e| ApiError::from_transport("Download failed", e))?;
    if !meta.is_success() {
        return Err(ApiError::upstream(
            "Download failed",
            parse::error_detail(&meta.body),
        ));
    }
    let filename = parse::parse_file_metadata(&meta.body)
        .map_err(|e| ApiError::from_transport("Download failed", e))?;

    let content = runtime::execute(&files::build_file_content(&state.cfg, &file_id))
        .await
        .map_err(|e| ApiError::from_transport("Download failed", e))?;
    if !content.is_success() {
        return Err(ApiError::upstream(
            "Download failed",
            parse::error_detail(&content.body),
        ));
    }

    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(content.body))
        .map_err(|e| ApiError::upstream("Download failed", Some(e.to_string())))
}
