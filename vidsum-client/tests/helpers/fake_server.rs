//! Fake summary service over real HTTP
//!
//! An axum router bound to an ephemeral localhost port that answers the
//! service endpoints from shared, test-controlled state.

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use vidsum_common::api::SummaryResponse;

/// What the fake server received for one upload
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub field_name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub len: usize,
}

#[derive(Default)]
pub struct FakeServerState {
    pub uploads: Vec<ReceivedUpload>,
    /// Processed results by stored filename
    pub summaries: HashMap<String, SummaryResponse>,
    pub frames: HashMap<String, Vec<u8>>,
    /// Refuse every upload with this `error` text
    pub reject_uploads: Option<String>,
    /// Fail every summarize call with an empty 500
    pub fail_summaries_silently: bool,
    /// Hold every summarize call this long before answering
    pub stall_summaries: Option<Duration>,
}

pub struct FakeServer {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<FakeServerState>>,
}

impl FakeServer {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeServerState::default()));

        let app = Router::new()
            .route("/api/upload", post(upload))
            .route("/api/summarize/:filename", get(summarize))
            .route("/api/frames/:frame_id", get(frame))
            .route("/api/health", get(health))
            .layer(DefaultBodyLimit::disable())
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Pre-register the summary returned for `filename`
    pub fn add_summary(&self, filename: &str, summary: &str, transcription: &str, frames: &[&str]) {
        self.state.lock().summaries.insert(
            filename.to_string(),
            SummaryResponse {
                summary: summary.to_string(),
                transcription: transcription.to_string(),
                key_frames: frames.iter().map(|f| f.to_string()).collect(),
                filename: Some(filename.to_string()),
                has_audio: Some(true),
            },
        );
    }
}

const ALLOWED_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn upload(
    State(state): State<Arc<Mutex<FakeServerState>>>,
    mut multipart: Multipart,
) -> Response {
    let mut received = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|c| c.to_string());
        let Ok(bytes) = field.bytes().await else {
            return error_json(StatusCode::BAD_REQUEST, "Upload interrupted");
        };
        received = Some(ReceivedUpload {
            field_name,
            file_name,
            content_type,
            len: bytes.len(),
        });
    }

    let Some(received) = received.filter(|r| r.field_name == "file") else {
        return error_json(StatusCode::BAD_REQUEST, "No file part");
    };

    let mut state = state.lock();
    state.uploads.push(received.clone());

    if let Some(message) = state.reject_uploads.clone() {
        return error_json(StatusCode::PAYLOAD_TOO_LARGE, &message);
    }

    let allowed = received
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !allowed {
        return error_json(StatusCode::BAD_REQUEST, "File type not allowed");
    }

    Json(json!({
        "status": "success",
        "message": "File uploaded successfully",
        "filename": received.file_name,
    }))
    .into_response()
}

async fn summarize(
    State(state): State<Arc<Mutex<FakeServerState>>>,
    Path(filename): Path<String>,
) -> Response {
    let stall = state.lock().stall_summaries;
    if let Some(stall) = stall {
        tokio::time::sleep(stall).await;
    }

    let state = state.lock();

    if state.fail_summaries_silently {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    match state.summaries.get(&filename) {
        Some(summary) => Json(summary.clone()).into_response(),
        None => error_json(StatusCode::NOT_FOUND, "File not found"),
    }
}

async fn frame(
    State(state): State<Arc<Mutex<FakeServerState>>>,
    Path(frame_id): Path<String>,
) -> Response {
    match state.lock().frames.get(&frame_id) {
        Some(bytes) => ([(header::CONTENT_TYPE, "image/jpeg")], bytes.clone()).into_response(),
        None => error_json(StatusCode::NOT_FOUND, "Frame not found"),
    }
}

async fn health() -> Response {
    Json(json!({
        "status": "healthy",
        "models": { "summarizer": true, "transcriber": true }
    }))
    .into_response()
}
