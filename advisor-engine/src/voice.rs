use crate::traits::{CaptureHandle, Microphone, Transcriber};
use advisor_core::audio::AudioClip;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Recording,
    Processing,
}

/// Voice-input affordance: accumulates audio chunks while recording, then
/// finalizes them into a single clip for transcription. The transcript is
/// never touched here; a successful result is handed back as if typed.
pub struct VoiceCapture {
    state: VoiceState,
    chunks: Vec<Vec<u8>>,
    device: Option<Box<dyn CaptureHandle>>,
    started_at: Option<Instant>,
}

impl VoiceCapture {
    pub fn new() -> Self {
        Self {
            state: VoiceState::Idle,
            chunks: Vec::new(),
            device: None,
            started_at: None,
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Seconds since recording started, for the capture timer display.
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    /// Acquires the input device and starts accumulating. A second call while
    /// not idle is ignored; an acquisition failure leaves the affordance idle.
    pub async fn start(&mut self, mic: &dyn Microphone) -> anyhow::Result<()> {
        if self.state != VoiceState::Idle {
            return Ok(());
        }

        let handle = mic.acquire().await?;
        self.device = Some(handle);
        self.chunks.clear();
        self.started_at = Some(Instant::now());
        self.state = VoiceState::Recording;
        Ok(())
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        if self.state == VoiceState::Recording && !chunk.is_empty() {
            self.chunks.push(chunk.to_vec());
        }
    }

    /// Cancel path: discards buffered audio and releases the device without
    /// any network call.
    pub fn cancel(&mut self) {
        self.chunks.clear();
        self.device = None;
        self.started_at = None;
        self.state = VoiceState::Idle;
    }

    /// Finalizes buffered audio into one clip and submits it for
    /// transcription. The device is released and the state returns to idle
    /// once the call settles, success or failure; a failure is logged and
    /// the attempted input is dropped.
    pub async fn finish(&mut self, transcriber: &dyn Transcriber) -> Option<String> {
        if self.state != VoiceState::Recording {
            return None;
        }
        self.state = VoiceState::Processing;

        let bytes: Vec<u8> = self.chunks.drain(..).flatten().collect();
        let clip = AudioClip::webm(bytes);
        let result = transcriber.transcribe(&clip).await;

        self.device = None;
        self.started_at = None;
        self.state = VoiceState::Idle;

        match result {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                log::warn!("transcription failed: {e}");
                None
            }
        }
    }
}

impl Default for VoiceCapture {
    fn default() -> Self {
        Self::new()
    }
}
