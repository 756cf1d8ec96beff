//! Summary service HTTP API
//!
//! Endpoint paths and JSON bodies of the remote video summary service.
//! Shared by the client and by the fake service used in integration tests.
//!
//! This module contains ONLY pure path helpers and serde types; no HTTP
//! framework dependencies.

pub mod types;

pub use types::{ErrorBody, HealthResponse, ModelStatus, SummaryResponse, UploadResponse};

/// Multipart upload endpoint
pub const UPLOAD_PATH: &str = "/api/upload";

/// Multipart field carrying the raw video
pub const UPLOAD_FIELD: &str = "file";

/// Service health endpoint
pub const HEALTH_PATH: &str = "/api/health";

/// Path segments of the result fetch endpoint, before the upload handle
pub const SUMMARIZE_SEGMENTS: [&str; 2] = ["api", "summarize"];

/// Path segments of the frame endpoint, before the frame id
pub const FRAME_SEGMENTS: [&str; 2] = ["api", "frames"];
