use crate::assistants::join_url;
use crate::multipart::MultipartForm;
use crate::request::HttpRequest;
use advisor_core::audio::AudioClip;
use advisor_core::config::AdvisorConfig;

const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Submits one finalized voice clip to the hosted speech-to-text endpoint.
pub fn build_transcription(cfg: &AdvisorConfig, clip: &AudioClip) -> HttpRequest {
    let (content_type, body) = MultipartForm::new()
        .file("file", &clip.filename, &clip.mime_type, &clip.bytes)
        .field("model", TRANSCRIPTION_MODEL)
        .field("temperature", "0")
        .finish();

    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.api_base, "/audio/transcriptions"),
        headers: vec![
            ("Content-Type".into(), content_type),
            ("Accept".into(), "application/json".into()),
            ("Authorization".into(), format!("Bearer {}", cfg.api_key)),
        ],
        body,
    }
}
