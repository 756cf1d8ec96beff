//! Error types for vidsum-client
//!
//! Two layers:
//! - `ServiceError`: what the HTTP exchange with the summary service produced
//! - `WorkflowError`: the terminal outcome of a submission, as shown to users
//!
//! The controller maps a `ServiceError` into a `WorkflowError` depending on
//! which phase (upload or result fetch) produced it.

use thiserror::Error;

/// Fallback text when the service gave no usable message
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred during processing";

/// Outcome of a submission other than success
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Submit without a selected file
    #[error("No file selected")]
    NoFileSelected,

    /// Dropped file is not a video
    #[error("Invalid file type: {mime_type:?}")]
    InvalidFileType { mime_type: String },

    /// Upload call returned a non-success response
    #[error("Upload rejected: {}", .0.as_deref().unwrap_or("no message"))]
    UploadRejected(Option<String>),

    /// Result fetch returned a non-success response
    #[error("Processing failed: {}", .0.as_deref().unwrap_or("no message"))]
    ProcessingFailed(Option<String>),

    /// Transport failure on either call
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Submit while another submission is in flight
    #[error("A submission is already in progress")]
    SubmissionInProgress,
}

impl WorkflowError {
    /// Text for display: server-provided when available, generic otherwise
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::NoFileSelected => "Please select a video file".to_string(),
            WorkflowError::InvalidFileType { .. } => "Please drop a valid video file".to_string(),
            WorkflowError::UploadRejected(Some(message))
            | WorkflowError::ProcessingFailed(Some(message)) => message.clone(),
            WorkflowError::UploadRejected(None)
            | WorkflowError::ProcessingFailed(None)
            | WorkflowError::NetworkError(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            WorkflowError::SubmissionInProgress => "A video is already being processed".to_string(),
        }
    }
}

/// Summary service client errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Non-success HTTP status, with the body's `error` text if present
    #[error("Service returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    /// Connection, timeout or transfer failure
    #[error("Network error: {0}")]
    Network(String),

    /// Success status with a body that does not match the API
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// Request could not be built (bad base URL, bad MIME type)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading the local file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Classify a failure of the upload call
    pub fn into_upload_error(self) -> WorkflowError {
        match self {
            ServiceError::Rejected { message, .. } => WorkflowError::UploadRejected(message),
            ServiceError::Decode(_) => WorkflowError::UploadRejected(None),
            ServiceError::Network(e) => WorkflowError::NetworkError(e),
            ServiceError::InvalidRequest(e) => WorkflowError::NetworkError(e),
            ServiceError::Io(e) => WorkflowError::NetworkError(e.to_string()),
        }
    }

    /// Classify a failure of the result fetch call
    pub fn into_processing_error(self) -> WorkflowError {
        match self {
            ServiceError::Rejected { message, .. } => WorkflowError::ProcessingFailed(message),
            ServiceError::Decode(_) => WorkflowError::ProcessingFailed(None),
            ServiceError::Network(e) => WorkflowError::NetworkError(e),
            ServiceError::InvalidRequest(e) => WorkflowError::NetworkError(e),
            ServiceError::Io(e) => WorkflowError::NetworkError(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::Decode(e.to_string())
        } else if e.is_builder() {
            ServiceError::InvalidRequest(e.to_string())
        } else {
            ServiceError::Network(e.to_string())
        }
    }
}
