//! Request/response bodies of the summary service
//!
//! Field names follow the service's JSON exactly (`transcription`,
//! `key_frames`, `has_audio`). Optional fields tolerate older service builds
//! that omit them.

use serde::{Deserialize, Serialize};

/// Body of a successful `POST /api/upload`
///
/// # Examples
///
/// ```
/// use vidsum_common::api::types::UploadResponse;
///
/// let body = r#"{"status":"success","message":"File uploaded successfully","filename":"clip.mp4"}"#;
/// let response: UploadResponse = serde_json::from_str(body).unwrap();
/// assert_eq!(response.filename, "clip.mp4");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadResponse {
    /// Stored name of the upload; the handle for the result fetch
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of a successful `GET /api/summarize/{filename}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub transcription: String,

    /// Frame ids in display order, retrievable via `GET /api/frames/{id}`
    pub key_frames: Vec<String>,

    /// Echo of the upload handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Whether an audio track was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_audio: Option<bool>,
}

/// Failure body returned by any endpoint
///
/// The service may also fail with an empty or non-JSON body; callers treat a
/// parse failure or an empty `error` string the same as `error: None`. Any
/// other text, whitespace included, is shown as sent.
///
/// # Examples
///
/// ```
/// use vidsum_common::api::types::ErrorBody;
///
/// let body: ErrorBody = serde_json::from_str(r#"{"error":"file too large"}"#).unwrap();
/// assert_eq!(body.error.as_deref(), Some("file too large"));
///
/// let empty: ErrorBody = serde_json::from_str("{}").unwrap();
/// assert!(empty.error.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Extract the `error` text from a raw response body, if there is one
    pub fn message_from_bytes(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
    }
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,

    #[serde(default)]
    pub models: ModelStatus,
}

/// Which service-side models are loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelStatus {
    #[serde(default)]
    pub summarizer: bool,
    #[serde(default)]
    pub transcriber: bool,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
