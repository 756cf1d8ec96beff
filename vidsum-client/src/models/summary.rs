//! Results handed back by the summary service

use serde::{Deserialize, Serialize};
use std::fmt;
use vidsum_common::api::SummaryResponse;

/// Server-assigned identifier of an uploaded video
///
/// Valid for one submission only; discarded at every terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadHandle(String);

impl UploadHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final summary of a processed video
///
/// Immutable once received; handed to the renderer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Text synopsis
    pub summary_text: String,
    /// Full transcript
    pub transcript: String,
    /// Key frame ids, in display order
    pub key_frame_ids: Vec<String>,
    /// Upload handle echoed by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
    /// Whether the service found an audio track
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_audio: Option<bool>,
}

impl From<SummaryResponse> for SummaryResult {
    fn from(response: SummaryResponse) -> Self {
        Self {
            summary_text: response.summary,
            transcript: response.transcription,
            key_frame_ids: response.key_frames,
            source_filename: response.filename,
            has_audio: response.has_audio,
        }
    }
}
