use crate::request::{Body, HttpRequest};
use advisor_core::config::AdvisorConfig;
use advisor_core::tool::ToolOutput;
use serde_json::json;

// The threads/runs surface is gated behind this header upstream.
const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

fn json_headers(cfg: &AdvisorConfig) -> Vec<(String, String)> {
    vec![
        ("Content-Type".into(), "application/json".into()),
        ("Authorization".into(), format!("Bearer {}", cfg.api_key)),
        (BETA_HEADER.0.into(), BETA_HEADER.1.into()),
    ]
}

/// `POST /threads` with no inputs; the response carries the opaque thread id.
pub fn build_create_thread(cfg: &AdvisorConfig) -> HttpRequest {
    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.api_base, "/threads"),
        headers: json_headers(cfg),
        body: Body::Json("{}".into()),
    }
}

/// Appends a user message to a thread. A `file_id` routes the attachment to
/// the code-execution tool.
pub fn build_create_message(
    cfg: &AdvisorConfig,
    thread_id: &str,
    content: &str,
    file_id: Option<&str>,
) -> HttpRequest {
    let mut payload = json!({
        "role": "user",
        "content": content,
    });
    if let Some(file_id) = file_id {
        payload["attachments"] = json!([
            {
                "file_id": file_id,
                "tools": [{"type": "code_interpreter"}],
            }
        ]);
    }

    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.api_base, &format!("/threads/{}/messages", thread_id)),
        headers: json_headers(cfg),
        body: Body::Json(payload.to_string()),
    }
}

/// Starts a streaming run of the configured assistant against a thread.
pub fn build_stream_run(cfg: &AdvisorConfig, thread_id: &str) -> HttpRequest {
    let payload = json!({
        "assistant_id": cfg.assistant_id,
        "stream": true,
    });

    let mut headers = json_headers(cfg);
    headers.push(("Accept".into(), "text/event-stream".into()));

    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.api_base, &format!("/threads/{}/runs", thread_id)),
        headers,
        body: Body::Json(payload.to_string()),
    }
}

/// Resumes a run paused on tool calls by submitting outputs; the reply is a
/// fresh event stream.
pub fn build_submit_tool_outputs(
    cfg: &AdvisorConfig,
    thread_id: &str,
    run_id: &str,
    outputs: &[ToolOutput],
) -> HttpRequest {
    let payload = json!({
        "tool_outputs": outputs,
        "stream": true,
    });

    let mut headers = json_headers(cfg);
    headers.push(("Accept".into(), "text/event-stream".into()));

    HttpRequest {
        method: "POST".into(),
        url: join_url(
            &cfg.api_base,
            &format!("/threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
        ),
        headers,
        body: Body::Json(payload.to_string()),
    }
}
