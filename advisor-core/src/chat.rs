use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

/// Handle to the transcript entry currently receiving streamed deltas.
///
/// The handle is an explicit reference rather than a "last element"
/// convention, so delta routing never depends on transcript position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMessage(usize);

/// Ordered conversation transcript.
///
/// Entries are append-only; the single exception is the open assistant entry,
/// which receives in-place text concatenation until it is sealed. At most one
/// entry is open at a time, and it is always the last element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<ChatMessage>,
    open: Option<OpenMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }

    /// True while an assistant entry is still receiving deltas.
    pub fn has_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        // A user entry after the open one would leave the open entry mid-list;
        // seal it first so the invariant holds.
        self.close_open();
        self.entries.push(ChatMessage {
            role: Role::User,
            text: text.into(),
        });
    }

    /// Appends an empty assistant entry and marks it open.
    pub fn open_assistant(&mut self) -> OpenMessage {
        self.close_open();
        self.entries.push(ChatMessage {
            role: Role::Assistant,
            text: String::new(),
        });
        let handle = OpenMessage(self.entries.len() - 1);
        self.open = Some(handle);
        handle
    }

    /// Ordered, append-only concatenation into the open entry.
    ///
    /// Returns false (and drops the delta) when nothing is open.
    pub fn append_open(&mut self, delta: &str) -> bool {
        match self.open {
            Some(OpenMessage(idx)) => {
                self.entries[idx].text.push_str(delta);
                true
            }
            None => false,
        }
    }

    /// Seals the open entry; its text is immutable afterwards.
    pub fn close_open(&mut self) {
        self.open = None;
    }
}
