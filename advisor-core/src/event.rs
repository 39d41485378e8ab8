use serde::{Deserialize, Serialize};

/// One decoded server-sent event of a streamed assistant run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantEvent {
    /// A new assistant reply began; the transcript opens an entry for it.
    TextCreated,
    /// An incremental fragment of the reply. A `None` value carries no text
    /// and is skipped by the session controller.
    TextDelta { value: Option<String> },
    /// The run paused awaiting tool outputs.
    RequiresAction {
        run_id: String,
        tool_calls: Vec<PendingToolCall>,
    },
    /// The run finished. This is the only event that ends a turn.
    RunCompleted,
    /// Any other wire event; logged and otherwise ignored.
    Other(String),
}

/// A tool invocation the assistant is waiting on mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}
