/// A finalized voice recording, assembled from the chunks a capture session
/// accumulated. Handed to the transcription bridge and then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    /// The container the recording affordance produces.
    pub fn webm(bytes: Vec<u8>) -> Self {
        Self {
            filename: "voice-input.webm".into(),
            mime_type: "audio/webm".into(),
            bytes,
        }
    }
}
