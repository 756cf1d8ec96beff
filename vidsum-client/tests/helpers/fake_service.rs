//! Scripted in-process SummaryService

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vidsum_client::{
    SelectedFile, ServiceError, SummaryResult, SummaryService, UploadHandle, UploadProgressFn,
};
use vidsum_common::api::{HealthResponse, ModelStatus};

pub enum UploadScript {
    Accept(String),
    Reject { status: u16, message: Option<String> },
    NetworkDown,
}

pub enum FetchScript {
    Succeed(SummaryResult),
    Reject { status: u16, message: Option<String> },
    NetworkDown,
    Malformed,
}

/// Fake service that replays a fixed script
///
/// The upload reports progress at each quarter listed in `upload_quarters`
/// (1 = 25%, 4 = 100%) before answering; the fetch answers after
/// `fetch_delay` of tokio time.
pub struct FakeService {
    upload: UploadScript,
    upload_quarters: Vec<u64>,
    fetch: FetchScript,
    fetch_delay: Duration,
    frames: HashMap<String, Vec<u8>>,
    pub upload_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub fetched_handles: parking_lot::Mutex<Vec<String>>,
}

impl FakeService {
    pub fn new(upload: UploadScript, fetch: FetchScript) -> Self {
        Self {
            upload,
            upload_quarters: vec![1, 2, 4],
            fetch,
            fetch_delay: Duration::from_millis(5_250),
            frames: HashMap::new(),
            upload_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            fetched_handles: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Upload accepted as `handle`, fetch returns `result`
    pub fn succeeding(handle: &str, result: SummaryResult) -> Self {
        Self::new(UploadScript::Accept(handle.to_string()), FetchScript::Succeed(result))
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn with_upload_quarters(mut self, quarters: Vec<u64>) -> Self {
        self.upload_quarters = quarters;
        self
    }

    pub fn with_frame(mut self, frame_id: &str, bytes: &[u8]) -> Self {
        self.frames.insert(frame_id.to_string(), bytes.to_vec());
        self
    }

    pub fn uploads(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryService for FakeService {
    async fn upload(
        &self,
        file: &SelectedFile,
        on_progress: UploadProgressFn,
    ) -> Result<UploadHandle, ServiceError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        for quarter in &self.upload_quarters {
            on_progress(file.size * quarter / 4, file.size);
            tokio::task::yield_now().await;
        }

        match &self.upload {
            UploadScript::Accept(handle) => Ok(UploadHandle::new(handle.clone())),
            UploadScript::Reject { status, message } => Err(ServiceError::Rejected {
                status: *status,
                message: message.clone(),
            }),
            UploadScript::NetworkDown => Err(ServiceError::Network("connection refused".to_string())),
        }
    }

    async fn fetch_summary(&self, handle: &UploadHandle) -> Result<SummaryResult, ServiceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched_handles.lock().push(handle.as_str().to_string());

        tokio::time::sleep(self.fetch_delay).await;

        match &self.fetch {
            FetchScript::Succeed(result) => Ok(result.clone()),
            FetchScript::Reject { status, message } => Err(ServiceError::Rejected {
                status: *status,
                message: message.clone(),
            }),
            FetchScript::NetworkDown => Err(ServiceError::Network("connection reset".to_string())),
            FetchScript::Malformed => Err(ServiceError::Decode("missing field `summary`".to_string())),
        }
    }

    async fn fetch_frame(&self, frame_id: &str) -> Result<Vec<u8>, ServiceError> {
        self.frames
            .get(frame_id)
            .cloned()
            .ok_or(ServiceError::Rejected {
                status: 404,
                message: Some("Frame not found".to_string()),
            })
    }

    async fn health(&self) -> Result<HealthResponse, ServiceError> {
        Ok(HealthResponse {
            status: "healthy".to_string(),
            models: ModelStatus {
                summarizer: true,
                transcriber: true,
            },
        })
    }
}
