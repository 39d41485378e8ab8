use crate::app::AppState;
use crate::error::ApiError;
use advisor_core::tool::normalize_tool_outputs;
use advisor_providers::request::HttpRequest;
use advisor_providers::{assistants, parse, runtime};
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use serde::Deserialize;
use serde_json::{Value, json};

/// Echo of the configured assistant identifier.
pub async fn assistant_id(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "assistantId": state.cfg.assistant_id }))
}

pub async fn create_thread(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let req = assistants::build_create_thread(&state.cfg);
    let resp = runtime::execute(&req)
        .await
        .map_err(|e| ApiError::from_transport("Thread creation failed", e))?;
    if !resp.is_success() {
        return Err(ApiError::upstream(
            "Thread creation failed",
            parse::error_detail(&resp.body),
        ));
    }

    let thread_id = parse::parse_thread_created(&resp.body)
        .map_err(|e| ApiError::from_transport("Thread creation failed", e))?;
    log::info!("created thread {thread_id}");
    Ok(Json(json!({ "threadId": thread_id })))
}

#[derive(Debug, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
}

/// Creates the user message (with a code-execution attachment when `file_id`
/// is present), then relays the streamed run verbatim.
pub async fn send_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(payload): Json<MessagePayload>,
) -> Result<Response, ApiError> {
    let content = payload.content.unwrap_or_default();
    let msg = assistants::build_create_message(
        &state.cfg,
        &thread_id,
        &content,
        payload.file_id.as_deref(),
    );
    let resp = runtime::execute(&msg)
        .await
        .map_err(|e| ApiError::from_transport("Message creation failed", e))?;
    if !resp.is_success() {
        return Err(ApiError::upstream(
            "Message creation failed",
            parse::error_detail(&resp.body),
        ));
    }

    let run = assistants::build_stream_run(&state.cfg, &thread_id);
    relay_stream(&run).await
}

#[derive(Debug, Deserialize)]
pub struct ActionsPayload {
    #[serde(rename = "toolCallOutputs")]
    pub tool_call_outputs: Value,
    #[serde(rename = "runId")]
    pub run_id: String,
}

/// Resumes a paused run with normalized tool outputs and relays the stream.
pub async fn submit_actions(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(payload): Json<ActionsPayload>,
) -> Result<Response, ApiError> {
    let outputs = normalize_tool_outputs(&payload.tool_call_outputs);
    let req = assistants::build_submit_tool_outputs(
        &state.cfg,
        &thread_id,
        &payload.run_id,
        &outputs,
    );
    relay_stream(&req).await
}

/// Forwards the upstream event stream byte-for-byte. The client owns stall
/// handling; the relay adds nothing but the content type.
async fn relay_stream(req: &HttpRequest) -> Result<Response, ApiError> {
    let upstream = runtime::open_stream(req)
        .await
        .map_err(|e| ApiError::from_transport("Streaming failed", e))?;

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ApiError::upstream("Streaming failed", Some(e.to_string())))
}
