use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ThreadCreated {
    id: String,
}

pub fn parse_thread_created(body: &[u8]) -> anyhow::Result<String> {
    let resp: ThreadCreated = serde_json::from_slice(body).context("decode thread JSON")?;
    Ok(resp.id)
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

pub fn parse_uploaded(body: &[u8]) -> anyhow::Result<String> {
    let resp: UploadedFile = serde_json::from_slice(body).context("decode upload JSON")?;
    Ok(resp.id)
}

#[derive(Debug, Deserialize)]
struct FileMetadata {
    filename: String,
}

pub fn parse_file_metadata(body: &[u8]) -> anyhow::Result<String> {
    let resp: FileMetadata = serde_json::from_slice(body).context("decode file metadata JSON")?;
    Ok(resp.filename)
}

#[derive(Debug, Deserialize)]
struct Transcription {
    text: String,
}

pub fn parse_transcription(body: &[u8]) -> anyhow::Result<String> {
    let resp: Transcription = serde_json::from_slice(body).context("decode transcription JSON")?;
    Ok(resp.text)
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: UpstreamErrorBody,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: String,
}

/// Extracts the upstream error message from a failed response body, when the
/// body follows the standard `{"error": {"message": ...}}` shape.
pub fn error_detail(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<UpstreamError>(body)
        .ok()
        .map(|e| e.error.message)
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
}
