//! Summary service client
//!
//! The controller talks to the service through the `SummaryService` trait so
//! tests can substitute an in-process fake. `HttpSummaryService` is the real
//! implementation over reqwest.
//!
//! Endpoints (relative to the configured base URL):
//! - `POST /api/upload` multipart, field `file`
//! - `GET /api/summarize/{filename}`
//! - `GET /api/frames/{frame_id}`
//! - `GET /api/health`

use crate::error::ServiceError;
use crate::models::{SelectedFile, SummaryResult, UploadHandle};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use vidsum_common::api::{
    self, ErrorBody, HealthResponse, SummaryResponse, UploadResponse, FRAME_SEGMENTS,
    SUMMARIZE_SEGMENTS,
};
use vidsum_common::config::ClientConfig;

/// Upload progress callback: `(bytes_sent, bytes_total)`
pub type UploadProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Operations of the remote summary service
#[async_trait]
pub trait SummaryService: Send + Sync {
    /// Upload the file as a multipart body, reporting byte progress
    async fn upload(
        &self,
        file: &SelectedFile,
        on_progress: UploadProgressFn,
    ) -> Result<UploadHandle, ServiceError>;

    /// Wait for the service to process an upload and return its summary
    async fn fetch_summary(&self, handle: &UploadHandle) -> Result<SummaryResult, ServiceError>;

    /// Raw image bytes of one key frame
    async fn fetch_frame(&self, frame_id: &str) -> Result<Vec<u8>, ServiceError>;

    /// Service liveness and model status
    async fn health(&self) -> Result<HealthResponse, ServiceError>;
}

/// reqwest-backed summary service client
pub struct HttpSummaryService {
    http_client: reqwest::Client,
    base_url: Url,
    fetch_timeout: Option<Duration>,
}

impl HttpSummaryService {
    /// Build a client for the configured base URL
    ///
    /// No overall request timeout is set: uploads of large videos and the
    /// service's processing time are both unbounded. The result fetch gets
    /// `http.fetch_timeout_secs` when configured.
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let base_url = Url::parse(&config.service_base_url)
            .map_err(|e| ServiceError::InvalidRequest(format!("{}: {}", config.service_base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidRequest(format!(
                "Not a base URL: {}",
                config.service_base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(config.http.user_agent.clone())
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            fetch_timeout: config.http.fetch_timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidRequest(format!("Not a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Endpoint for an absolute API path such as `/api/upload`
    fn endpoint_for_path(&self, path: &str) -> Result<Url, ServiceError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.endpoint(&segments)
    }

    /// URL of a key frame image, for renderers that link instead of download
    pub fn frame_url(&self, frame_id: &str) -> Result<Url, ServiceError> {
        self.endpoint(&[FRAME_SEGMENTS[0], FRAME_SEGMENTS[1], frame_id])
    }
}

/// Turn a non-success response into `ServiceError::Rejected`
async fn reject_unless_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = ErrorBody::message_from_bytes(&body);

    tracing::warn!(
        status = status.as_u16(),
        message = message.as_deref().unwrap_or(""),
        "Summary service rejected request"
    );

    Err(ServiceError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SummaryService for HttpSummaryService {
    async fn upload(
        &self,
        file: &SelectedFile,
        on_progress: UploadProgressFn,
    ) -> Result<UploadHandle, ServiceError> {
        let url = self.endpoint_for_path(api::UPLOAD_PATH)?;
        let total = file.size;

        let source = tokio::fs::File::open(&file.path).await?;
        let mut sent: u64 = 0;
        let counted = ReaderStream::new(source).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                on_progress(sent.min(total), total);
            }
            chunk
        });

        let part = Part::stream_with_length(Body::wrap_stream(counted), total)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(api::UPLOAD_FIELD, part);

        tracing::info!(file = %file.name, size = total, url = %url, "Uploading video");

        let response = self.http_client.post(url).multipart(form).send().await?;
        let response = reject_unless_success(response).await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        if body.filename.trim().is_empty() {
            return Err(ServiceError::Decode("empty filename in upload response".to_string()));
        }

        tracing::info!(handle = %body.filename, "Upload accepted");
        Ok(UploadHandle::new(body.filename))
    }

    async fn fetch_summary(&self, handle: &UploadHandle) -> Result<SummaryResult, ServiceError> {
        let url = self.endpoint(&[SUMMARIZE_SEGMENTS[0], SUMMARIZE_SEGMENTS[1], handle.as_str()])?;

        let mut request = self.http_client.get(url);
        if let Some(timeout) = self.fetch_timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(handle = %handle, "Fetching summary");

        let response = reject_unless_success(request.send().await?).await?;
        let body: SummaryResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        tracing::info!(
            handle = %handle,
            key_frames = body.key_frames.len(),
            transcript_chars = body.transcription.len(),
            "Summary received"
        );

        Ok(SummaryResult::from(body))
    }

    async fn fetch_frame(&self, frame_id: &str) -> Result<Vec<u8>, ServiceError> {
        let url = self.frame_url(frame_id)?;
        let response = reject_unless_success(self.http_client.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn health(&self) -> Result<HealthResponse, ServiceError> {
        let url = self.endpoint_for_path(api::HEALTH_PATH)?;
        let response = reject_unless_success(self.http_client.get(url).send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }
}
