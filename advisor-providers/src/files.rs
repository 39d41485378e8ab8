use crate::assistants::join_url;
use crate::multipart::MultipartForm;
use crate::request::{Body, HttpRequest};
use advisor_core::config::AdvisorConfig;

fn auth_header(cfg: &AdvisorConfig) -> (String, String) {
    ("Authorization".into(), format!("Bearer {}", cfg.api_key))
}

/// Uploads a file to hosted storage for later use by the assistant's tools.
pub fn build_upload_file(
    cfg: &AdvisorConfig,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) -> HttpRequest {
    let (content_type, body) = MultipartForm::new()
        .field("purpose", "assistants")
        .file("file", filename, mime_type, bytes)
        .finish();

    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.api_base, "/files"),
        headers: vec![
            ("Content-Type".into(), content_type),
            ("Accept".into(), "application/json".into()),
            auth_header(cfg),
        ],
        body,
    }
}

/// Fetches stored metadata (the original filename) for a file id.
pub fn build_retrieve_file(cfg: &AdvisorConfig, file_id: &str) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url: join_url(&cfg.api_base, &format!("/files/{}", file_id)),
        headers: vec![auth_header(cfg)],
        body: Body::Empty,
    }
}

/// Fetches the raw stored bytes for a file id.
pub fn build_file_content(cfg: &AdvisorConfig, file_id: &str) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url: join_url(&cfg.api_base, &format!("/files/{}/content", file_id)),
        headers: vec![auth_header(cfg)],
        body: Body::Empty,
    }
}
