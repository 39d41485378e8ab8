use advisor_core::event::{AssistantEvent, PendingToolCall};
use serde::Deserialize;

/// One complete server-sent event block: `event:` name plus joined `data:`
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental server-sent-event parser.
///
/// Chunk boundaries fall anywhere, including inside a UTF-8 sequence, so raw
/// bytes are buffered and only complete lines are consumed.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    event: String,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one transport chunk and returns every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.event.is_empty() || !self.data.is_empty() {
                    frames.push(SseFrame {
                        event: std::mem::take(&mut self.event),
                        data: std::mem::take(&mut self.data).join("\n"),
                    });
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("event:") {
                self.event = rest.trim_start().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data.push(rest.trim_start().to_string());
            }
            // id:, retry: and comment lines carry nothing this consumer needs.
        }
        frames
    }
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    delta: DeltaBody,
}

#[derive(Debug, Deserialize)]
struct DeltaBody {
    #[serde(default)]
    content: Vec<DeltaContent>,
}

#[derive(Debug, Deserialize)]
struct DeltaContent {
    #[serde(rename = "type", default)]
    kind: String,
    text: Option<DeltaText>,
}

#[derive(Debug, Deserialize)]
struct DeltaText {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunPayload {
    id: String,
    required_action: Option<RequiredAction>,
}

#[derive(Debug, Deserialize)]
struct RequiredAction {
    submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Debug, Deserialize)]
struct SubmitToolOutputs {
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: Option<WireFunction>,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Maps a wire frame to the controller-facing event model. Unknown event
/// kinds and unrecognized payload shapes degrade to `Other`; they must never
/// break a running stream.
pub fn decode_event(frame: &SseFrame) -> AssistantEvent {
    match frame.event.as_str() {
        "thread.message.created" => AssistantEvent::TextCreated,
        "thread.message.delta" => AssistantEvent::TextDelta {
            value: delta_text(&frame.data),
        },
        "thread.run.requires_action" => {
            requires_action(&frame.data).unwrap_or_else(|| AssistantEvent::Other(frame.event.clone()))
        }
        "thread.run.completed" => AssistantEvent::RunCompleted,
        other => AssistantEvent::Other(other.to_string()),
    }
}

fn delta_text(data: &str) -> Option<String> {
    let parsed: MessageDelta = serde_json::from_str(data).ok()?;
    let mut out = String::new();
    let mut any = false;
    for part in parsed.delta.content {
        if part.kind != "text" {
            continue;
        }
        if let Some(value) = part.text.and_then(|t| t.value) {
            out.push_str(&value);
            any = true;
        }
    }
    any.then_some(out)
}

fn requires_action(data: &str) -> Option<AssistantEvent> {
    let run: RunPayload = serde_json::from_str(data).ok()?;
    let action = run.required_action?;
    let tool_calls = action
        .submit_tool_outputs
        .tool_calls
        .into_iter()
        .map(|c| {
            let function = c.function.unwrap_or(WireFunction {
                name: String::new(),
                arguments: String::new(),
            });
            PendingToolCall {
                id: c.id,
                name: function.name,
                arguments: function.arguments,
            }
        })
        .collect();
    Some(AssistantEvent::RequiresAction {
        run_id: run.id,
        tool_calls,
    })
}
