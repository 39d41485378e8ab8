use crate::traits::{AssistantApi, EventStream, Transcriber};
use advisor_core::audio::AudioClip;
use advisor_core::config::AdvisorConfig;
use advisor_core::tool::ToolOutput;
use advisor_providers::{assistants, parse, runtime, transcribe};
use async_trait::async_trait;
use std::sync::Arc;

fn upstream_error(what: &str, resp: &runtime::HttpResponse) -> anyhow::Error {
    anyhow::anyhow!(
        "{what} failed ({}): {}",
        resp.status,
        parse::error_detail(&resp.body).unwrap_or_else(|| "no detail".into())
    )
}

/// `AssistantApi` over the hosted threads/runs endpoints.
pub struct HostedAssistant {
    cfg: Arc<AdvisorConfig>,
}

impl HostedAssistant {
    pub fn new(cfg: Arc<AdvisorConfig>) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl AssistantApi for HostedAssistant {
    async fn create_thread(&self) -> anyhow::Result<String> {
        let req = assistants::build_create_thread(&self.cfg);
        let resp = runtime::execute(&req).await?;
        if !resp.is_success() {
            return Err(upstream_error("thread creation", &resp));
        }
        parse::parse_thread_created(&resp.body)
    }

    async fn stream_message(
        &self,
        thread_id: &str,
        content: &str,
        file_id: Option<&str>,
    ) -> anyhow::Result<EventStream> {
        // The message must exist before the run starts; the run stream is the
        // only reply the caller sees.
        let msg = assistants::build_create_message(&self.cfg, thread_id, content, file_id);
        let resp = runtime::execute(&msg).await?;
        if !resp.is_success() {
            return Err(upstream_error("message creation", &resp));
        }

        let run = assistants::build_stream_run(&self.cfg, thread_id);
        Ok(runtime::stream_events(&run).await?)
    }

    async fn stream_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> anyhow::Result<EventStream> {
        let req = assistants::build_submit_tool_outputs(&self.cfg, thread_id, run_id, outputs);
        Ok(runtime::stream_events(&req).await?)
    }
}

/// `Transcriber` over the hosted speech-to-text endpoint.
pub struct HostedTranscriber {
    cfg: Arc<AdvisorConfig>,
}

impl HostedTranscriber {
    pub fn new(cfg: Arc<AdvisorConfig>) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl Transcriber for HostedTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> anyhow::Result<String> {
        let req = transcribe::build_transcription(&self.cfg, clip);
        let resp = runtime::execute(&req).await?;
        if !resp.is_success() {
            return Err(upstream_error("transcription", &resp));
        }
        parse::parse_transcription(&resp.body)
    }
}
