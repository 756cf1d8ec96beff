//! vidsum-client library interface
//!
//! Upload-and-poll client for the video summary service. Exposes the
//! session, controller and service seams for the `vidsum` binary and for
//! integration testing.

pub mod controller;
pub mod error;
pub mod events;
pub mod models;
pub mod progress;
pub mod render;
pub mod selection;
pub mod service;
pub mod session;

pub use crate::controller::UploadController;
pub use crate::error::{ServiceError, WorkflowError, GENERIC_FAILURE_MESSAGE};
pub use crate::events::{EventBus, WorkflowEvent};
pub use crate::models::{SelectedFile, SummaryResult, UploadHandle, WorkflowSnapshot, WorkflowState};
pub use crate::service::{HttpSummaryService, SummaryService, UploadProgressFn};
pub use crate::session::UploadSession;
