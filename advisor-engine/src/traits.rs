use advisor_core::audio::AudioClip;
use advisor_core::event::AssistantEvent;
use advisor_core::tool::ToolOutput;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

/// Ordered stream of decoded events for one assistant run.
pub type EventStream = Pin<Box<dyn Stream<Item = anyhow::Result<AssistantEvent>> + Send>>;

#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Creates a server-side conversation thread and returns its opaque id.
    async fn create_thread(&self) -> anyhow::Result<String>;

    /// Posts a user message (optionally with a code-execution attachment) and
    /// starts a streaming run against the thread.
    async fn stream_message(
        &self,
        thread_id: &str,
        content: &str,
        file_id: Option<&str>,
    ) -> anyhow::Result<EventStream>;

    /// Resumes a run paused on tool calls by submitting outputs; the reply is
    /// a fresh event stream.
    async fn stream_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> anyhow::Result<EventStream>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> anyhow::Result<String>;
}

/// An acquired audio input device. Dropping the handle releases it.
pub trait CaptureHandle: Send {}

#[async_trait]
pub trait Microphone: Send + Sync {
    async fn acquire(&self) -> anyhow::Result<Box<dyn CaptureHandle>>;
}
