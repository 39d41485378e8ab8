use crate::traits::{AssistantApi, EventStream};
use advisor_core::chat::Transcript;
use advisor_core::event::{AssistantEvent, PendingToolCall};
use advisor_core::tool::normalize_tool_outputs;
use futures_util::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a response is still in flight")]
    InputLocked,

    #[error("nothing to submit")]
    EmptyInput,

    #[error("no run is awaiting tool outputs")]
    NoPendingRun,

    #[error("stream ended before the run completed")]
    StreamInterrupted,

    #[error("no event arrived within {0:?}")]
    StreamStalled(Duration),

    #[error("turn cancelled")]
    Cancelled,

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Where the controller is inside one conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingFirstToken,
    Streaming,
    AwaitingToolOutputs,
}

/// How a driven stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    /// The run paused on tool calls; input stays locked until
    /// `submit_tool_outputs` drives the resumed stream to completion.
    AwaitingToolOutputs {
        run_id: String,
        tool_calls: Vec<PendingToolCall>,
    },
}

/// Drives one request/response cycle per user turn and keeps transcript and
/// lock state consistent with exactly one active stream at a time.
///
/// A stalled or dying stream must never leave the input locked: every
/// failure path releases the lock and surfaces a typed error.
pub struct ChatController {
    api: Arc<dyn AssistantApi>,
    thread_id: String,
    transcript: Transcript,
    phase: Phase,
    stall_timeout: Duration,
    cancel: CancellationToken,
    pending_run: Option<String>,
}

impl ChatController {
    /// Creates the server-side thread once; the id is immutable afterwards.
    pub async fn start(api: Arc<dyn AssistantApi>) -> anyhow::Result<Self> {
        let thread_id = api.create_thread().await?;
        Ok(Self {
            api,
            thread_id,
            transcript: Transcript::new(),
            phase: Phase::Idle,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
            cancel: CancellationToken::new(),
            pending_run: None,
        })
    }

    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Token that aborts the turn currently being driven.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Run id of the turn paused on tool calls, if any.
    pub fn pending_run(&self) -> Option<&str> {
        self.pending_run.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True from submission until the matching run-completed event.
    pub fn input_locked(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Presentation flag behind the typing indicator; the assistant counts as
    /// responding while its run is mid-stream or executing tools.
    pub fn is_responding(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub async fn submit_text(&mut self, text: &str) -> Result<TurnOutcome, SessionError> {
        self.submit_text_with_hook(text, |_| {}).await
    }

    /// Same as `submit_text`, invoking `on_update` after every transcript
    /// mutation so a presentation layer can render tokens as they arrive.
    pub async fn submit_text_with_hook<F>(
        &mut self,
        text: &str,
        on_update: F,
    ) -> Result<TurnOutcome, SessionError>
    where
        F: FnMut(&Transcript),
    {
        if self.input_locked() {
            return Err(SessionError::InputLocked);
        }
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        self.transcript.push_user(text);
        self.phase = Phase::AwaitingFirstToken;

        let stream = match self.api.stream_message(&self.thread_id, text, None).await {
            Ok(stream) => stream,
            Err(e) => {
                self.abort_turn();
                return Err(SessionError::Transport(e));
            }
        };
        self.drive(stream, on_update).await
    }

    pub async fn submit_file(&mut self, file_id: &str) -> Result<TurnOutcome, SessionError> {
        self.submit_file_with_hook(file_id, |_| {}).await
    }

    /// Submits an uploaded file for the code-execution tool. The transcript
    /// gains a synthetic user entry describing the attachment.
    pub async fn submit_file_with_hook<F>(
        &mut self,
        file_id: &str,
        on_update: F,
    ) -> Result<TurnOutcome, SessionError>
    where
        F: FnMut(&Transcript),
    {
        if self.input_locked() {
            return Err(SessionError::InputLocked);
        }
        if file_id.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        self.transcript
            .push_user(format!("📎 Uploaded file — {file_id}"));
        self.phase = Phase::AwaitingFirstToken;

        let stream = match self.api.stream_message(&self.thread_id, "", Some(file_id)).await {
            Ok(stream) => stream,
            Err(e) => {
                self.abort_turn();
                return Err(SessionError::Transport(e));
            }
        };
        self.drive(stream, on_update).await
    }

    pub async fn submit_tool_outputs(
        &mut self,
        outputs: &Value,
        run_id: &str,
    ) -> Result<TurnOutcome, SessionError> {
        self.submit_tool_outputs_with_hook(outputs, run_id, |_| {})
            .await
    }

    /// Resumes a run paused on tool calls. The payload is normalized to the
    /// upstream schema: a single object becomes a one-element list, non-string
    /// outputs are JSON-encoded, absent outputs become the empty string.
    pub async fn submit_tool_outputs_with_hook<F>(
        &mut self,
        outputs: &Value,
        run_id: &str,
        on_update: F,
    ) -> Result<TurnOutcome, SessionError>
    where
        F: FnMut(&Transcript),
    {
        if self.phase != Phase::AwaitingToolOutputs {
            return Err(SessionError::NoPendingRun);
        }

        let normalized = normalize_tool_outputs(outputs);
        self.phase = Phase::AwaitingFirstToken;

        let stream = match self
            .api
            .stream_tool_outputs(&self.thread_id, run_id, &normalized)
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                self.abort_turn();
                return Err(SessionError::Transport(e));
            }
        };
        self.drive(stream, on_update).await
    }

    async fn drive<F>(
        &mut self,
        mut stream: EventStream,
        mut on_update: F,
    ) -> Result<TurnOutcome, SessionError>
    where
        F: FnMut(&Transcript),
    {
        // The cancellation future must not borrow `self` across the select.
        let cancel = self.cancel.clone();
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    self.abort_turn();
                    return Err(SessionError::Cancelled);
                }
                next = tokio::time::timeout(self.stall_timeout, stream.next()) => next,
            };

            let event = match next {
                Err(_) => {
                    self.abort_turn();
                    return Err(SessionError::StreamStalled(self.stall_timeout));
                }
                Ok(None) => {
                    self.abort_turn();
                    return Err(SessionError::StreamInterrupted);
                }
                Ok(Some(Err(e))) => {
                    self.abort_turn();
                    return Err(SessionError::Transport(e));
                }
                Ok(Some(Ok(event))) => event,
            };

            match event {
                AssistantEvent::TextCreated => {
                    self.transcript.open_assistant();
                    self.phase = Phase::Streaming;
                    on_update(&self.transcript);
                }
                AssistantEvent::TextDelta { value: Some(value) } => {
                    self.transcript.append_open(&value);
                    on_update(&self.transcript);
                }
                AssistantEvent::TextDelta { value: None } => {}
                AssistantEvent::RequiresAction { run_id, tool_calls } => {
                    self.transcript.close_open();
                    self.phase = Phase::AwaitingToolOutputs;
                    self.pending_run = Some(run_id.clone());
                    return Ok(TurnOutcome::AwaitingToolOutputs { run_id, tool_calls });
                }
                AssistantEvent::RunCompleted => {
                    self.transcript.close_open();
                    self.phase = Phase::Idle;
                    self.pending_run = None;
                    on_update(&self.transcript);
                    return Ok(TurnOutcome::Completed);
                }
                AssistantEvent::Other(kind) => {
                    log::debug!("ignoring stream event: {kind}");
                }
            }
        }
    }

    fn abort_turn(&mut self) {
        self.transcript.close_open();
        self.phase = Phase::Idle;
        self.pending_run = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::AssistantApi;
    use advisor_core::chat::Role;
    use advisor_core::tool::ToolOutput;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted transport: each submission pops the next canned event list.
    struct ScriptedApi {
        scripts: Mutex<Vec<Vec<anyhow::Result<AssistantEvent>>>>,
        tool_submissions: Mutex<Vec<Vec<ToolOutput>>>,
    }

    impl ScriptedApi {
        fn new(scripts: Vec<Vec<anyhow::Result<AssistantEvent>>>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts),
                tool_submissions: Mutex::new(Vec::new()),
            })
        }

        fn next_stream(&self) -> anyhow::Result<EventStream> {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                anyhow::bail!("no scripted stream left");
            }
            let events = scripts.remove(0);
            Ok(Box::pin(futures_util::stream::iter(events)))
        }
    }

    #[async_trait]
    impl AssistantApi for ScriptedApi {
        async fn create_thread(&self) -> anyhow::Result<String> {
            Ok("thread_test".into())
        }

        async fn stream_message(
            &self,
            _thread_id: &str,
            _content: &str,
            _file_id: Option<&str>,
        ) -> anyhow::Result<EventStream> {
            self.next_stream()
        }

        async fn stream_tool_outputs(
            &self,
            _thread_id: &str,
            _run_id: &str,
            outputs: &[ToolOutput],
        ) -> anyhow::Result<EventStream> {
            self.tool_submissions.lock().unwrap().push(outputs.to_vec());
            self.next_stream()
        }
    }

    fn delta(value: &str) -> anyhow::Result<AssistantEvent> {
        Ok(AssistantEvent::TextDelta {
            value: Some(value.into()),
        })
    }

    #[tokio::test]
    async fn full_turn_builds_the_reply_and_unlocks() {
        let api = ScriptedApi::new(vec![vec![
            Ok(AssistantEvent::Other("thread.run.created".into())),
            Ok(AssistantEvent::TextCreated),
            delta("Hi"),
            delta(" there"),
            delta("!"),
            Ok(AssistantEvent::RunCompleted),
        ]]);
        let mut ctl = ChatController::start(api).await.unwrap();
        assert_eq!(ctl.thread_id(), "thread_test");

        let outcome = ctl.submit_text("Hello").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Completed);

        let entries = ctl.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].text, "Hello");
        assert_eq!(entries[1].role, Role::Assistant);
        assert_eq!(entries[1].text, "Hi there!");
        assert!(!ctl.input_locked());
        assert!(!ctl.is_responding());
    }

    #[tokio::test]
    async fn lock_is_held_exactly_until_run_completed() {
        let api = ScriptedApi::new(vec![vec![
            Ok(AssistantEvent::TextCreated),
            delta("a"),
            Ok(AssistantEvent::RunCompleted),
            // Trailing events after completion are never consumed.
        ]]);
        let mut ctl = ChatController::start(api).await.unwrap();

        let mut observed_locked = false;
        ctl.submit_text_with_hook("q", |_| {
            observed_locked = true;
        })
        .await
        .unwrap();

        assert!(observed_locked);
        assert!(!ctl.input_locked());
    }

    #[tokio::test]
    async fn null_deltas_and_unknown_events_are_ignored() {
        let api = ScriptedApi::new(vec![vec![
            Ok(AssistantEvent::TextCreated),
            Ok(AssistantEvent::TextDelta { value: None }),
            delta("ok"),
            Ok(AssistantEvent::Other("thread.run.step.delta".into())),
            Ok(AssistantEvent::RunCompleted),
        ]]);
        let mut ctl = ChatController::start(api).await.unwrap();
        ctl.submit_text("q").await.unwrap();
        assert_eq!(ctl.transcript().last().unwrap().text, "ok");
    }

    #[tokio::test]
    async fn rejects_submission_while_awaiting_tool_outputs() {
        let api = ScriptedApi::new(vec![vec![Ok(AssistantEvent::RequiresAction {
            run_id: "run_1".into(),
            tool_calls: vec![],
        })]]);
        let mut ctl = ChatController::start(api).await.unwrap();

        let outcome = ctl.submit_text("q").await.unwrap();
        assert!(matches!(outcome, TurnOutcome::AwaitingToolOutputs { .. }));
        assert!(ctl.input_locked());

        let err = ctl.submit_text("again").await.unwrap_err();
        assert!(matches!(err, SessionError::InputLocked));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_without_side_effects() {
        let api = ScriptedApi::new(vec![]);
        let mut ctl = ChatController::start(api).await.unwrap();
        let err = ctl.submit_text("   ").await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyInput));
        assert!(ctl.transcript().is_empty());
        assert!(!ctl.input_locked());
    }

    #[tokio::test]
    async fn file_submission_appends_synthetic_user_entry() {
        let api = ScriptedApi::new(vec![vec![
            Ok(AssistantEvent::TextCreated),
            delta("parsed your file"),
            Ok(AssistantEvent::RunCompleted),
        ]]);
        let mut ctl = ChatController::start(api).await.unwrap();
        ctl.submit_file("file-42").await.unwrap();

        let entries = ctl.transcript().entries();
        assert_eq!(entries[0].role, Role::User);
        assert!(entries[0].text.contains("file-42"));
        assert_eq!(entries[1].text, "parsed your file");
    }

    #[tokio::test]
    async fn tool_outputs_resume_the_paused_run_normalized() {
        let api = ScriptedApi::new(vec![
            vec![Ok(AssistantEvent::RequiresAction {
                run_id: "run_9".into(),
                tool_calls: vec![PendingToolCall {
                    id: "call_1".into(),
                    name: "calc".into(),
                    arguments: "{}".into(),
                }],
            })],
            vec![
                Ok(AssistantEvent::TextCreated),
                delta("done"),
                Ok(AssistantEvent::RunCompleted),
            ],
        ]);
        let mut ctl = ChatController::start(api.clone()).await.unwrap();

        let outcome = ctl.submit_text("compute").await.unwrap();
        let TurnOutcome::AwaitingToolOutputs { run_id, tool_calls } = outcome else {
            panic!("expected a paused run");
        };
        assert_eq!(tool_calls[0].name, "calc");

        let outcome = ctl
            .submit_tool_outputs(&json!({"tool_call_id": "call_1", "output": {"x": 1}}), &run_id)
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Completed);
        assert!(!ctl.input_locked());
        assert_eq!(ctl.transcript().last().unwrap().text, "done");

        let submissions = api.tool_submissions.lock().unwrap();
        assert_eq!(
            submissions[0],
            vec![ToolOutput {
                tool_call_id: "call_1".into(),
                output: r#"{"x":1}"#.into(),
            }]
        );
    }

    #[tokio::test]
    async fn tool_outputs_without_paused_run_are_rejected() {
        let api = ScriptedApi::new(vec![]);
        let mut ctl = ChatController::start(api).await.unwrap();
        let err = ctl
            .submit_tool_outputs(&json!([]), "run_1")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoPendingRun));
    }

    #[tokio::test]
    async fn interrupted_stream_releases_the_lock() {
        let api = ScriptedApi::new(vec![vec![Ok(AssistantEvent::TextCreated), delta("par")]]);
        let mut ctl = ChatController::start(api).await.unwrap();

        let err = ctl.submit_text("q").await.unwrap_err();
        assert!(matches!(err, SessionError::StreamInterrupted));
        assert!(!ctl.input_locked());
        // The partial reply stays visible but is sealed.
        assert_eq!(ctl.transcript().last().unwrap().text, "par");
        assert!(!ctl.transcript().has_open());
    }

    #[tokio::test]
    async fn transport_error_mid_stream_releases_the_lock() {
        let api = ScriptedApi::new(vec![vec![
            Ok(AssistantEvent::TextCreated),
            Err(anyhow::anyhow!("connection reset")),
        ]]);
        let mut ctl = ChatController::start(api).await.unwrap();
        let err = ctl.submit_text("q").await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert!(!ctl.input_locked());
    }

    #[tokio::test]
    async fn stalled_stream_times_out_and_unlocks() {
        let api = ScriptedApi::new(vec![vec![Ok(AssistantEvent::TextCreated)]]);
        // A pending-forever tail after the scripted events.
        struct StallApi(Arc<ScriptedApi>);

        #[async_trait]
        impl AssistantApi for StallApi {
            async fn create_thread(&self) -> anyhow::Result<String> {
                self.0.create_thread().await
            }

            async fn stream_message(
                &self,
                thread_id: &str,
                content: &str,
                file_id: Option<&str>,
            ) -> anyhow::Result<EventStream> {
                let head = self.0.stream_message(thread_id, content, file_id).await?;
                Ok(Box::pin(head.chain(futures_util::stream::pending())))
            }

            async fn stream_tool_outputs(
                &self,
                thread_id: &str,
                run_id: &str,
                outputs: &[ToolOutput],
            ) -> anyhow::Result<EventStream> {
                self.0.stream_tool_outputs(thread_id, run_id, outputs).await
            }
        }

        let mut ctl = ChatController::start(Arc::new(StallApi(api)))
            .await
            .unwrap()
            .with_stall_timeout(Duration::from_millis(20));

        let err = ctl.submit_text("q").await.unwrap_err();
        assert!(matches!(err, SessionError::StreamStalled(_)));
        assert!(!ctl.input_locked());
    }

    #[tokio::test]
    async fn cancellation_aborts_the_turn_and_unlocks() {
        let api = ScriptedApi::new(vec![vec![Ok(AssistantEvent::TextCreated)]]);
        struct StallApi(Arc<ScriptedApi>);

        #[async_trait]
        impl AssistantApi for StallApi {
            async fn create_thread(&self) -> anyhow::Result<String> {
                self.0.create_thread().await
            }

            async fn stream_message(
                &self,
                thread_id: &str,
                content: &str,
                file_id: Option<&str>,
            ) -> anyhow::Result<EventStream> {
                let head = self.0.stream_message(thread_id, content, file_id).await?;
                Ok(Box::pin(head.chain(futures_util::stream::pending())))
            }

            async fn stream_tool_outputs(
                &self,
                thread_id: &str,
                run_id: &str,
                outputs: &[ToolOutput],
            ) -> anyhow::Result<EventStream> {
                self.0.stream_tool_outputs(thread_id, run_id, outputs).await
            }
        }

        let mut ctl = ChatController::start(Arc::new(StallApi(api))).await.unwrap();
        let cancel = ctl.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });

        let err = ctl.submit_text("q").await.unwrap_err();
        assert!(matches!(err, SessionError::Cancelled));
        assert!(!ctl.input_locked());
    }
}
