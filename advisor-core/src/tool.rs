use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool result in the shape the hosted API accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Normalizes a tool-output payload to a list of `ToolOutput`.
///
/// A single object is wrapped into a one-element list. An `output` that is
/// not already a string is serialized to its textual JSON form; an absent
/// (or null) `output` becomes the empty string. The coercion is lossy on
/// purpose; it matches the upstream schema.
pub fn normalize_tool_outputs(value: &Value) -> Vec<ToolOutput> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    items
        .into_iter()
        .map(|item| ToolOutput {
            tool_call_id: coerce_id(item.get("tool_call_id")),
            output: match item.get("output") {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            },
        })
        .collect()
}

fn coerce_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
