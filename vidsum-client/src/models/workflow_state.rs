//! Workflow state machine
//!
//! One submission progresses through:
//! IDLE/FILE_READY → UPLOADING → SERVER_PROCESSING → SUCCEEDED | FAILED
//!
//! Only the upload controller writes these states. Renderers read them from
//! `WorkflowSnapshot`s, which pair the state with the displayed progress.

use super::{SelectedFile, SummaryResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current workflow state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    /// No file, no activity
    Idle,
    /// A file is selected and can be submitted
    FileReady { file: SelectedFile },
    /// Multipart upload in flight
    Uploading {
        file: SelectedFile,
        bytes_sent: u64,
        bytes_total: u64,
    },
    /// Upload done, waiting for the service's result
    ServerProcessing { estimated_progress: u8 },
    /// Result received
    Succeeded { result: SummaryResult },
    /// Attempt abandoned; message is ready for display
    Failed { message: String },
}

impl WorkflowState {
    /// Short state name for logs
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::FileReady { .. } => "file_ready",
            WorkflowState::Uploading { .. } => "uploading",
            WorkflowState::ServerProcessing { .. } => "server_processing",
            WorkflowState::Succeeded { .. } => "succeeded",
            WorkflowState::Failed { .. } => "failed",
        }
    }

    /// No further automatic transition follows
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Succeeded { .. } | WorkflowState::Failed { .. }
        )
    }

    /// A submission owns the controller
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            WorkflowState::Uploading { .. } | WorkflowState::ServerProcessing { .. }
        )
    }

    /// Stage text shown next to the progress bar
    pub fn stage_label(&self) -> Option<&'static str> {
        match self {
            WorkflowState::Uploading { .. } => Some("Uploading"),
            WorkflowState::ServerProcessing { .. } => Some("Processing video"),
            WorkflowState::Succeeded { .. } => Some("Complete"),
            _ => None,
        }
    }
}

/// State plus the unified 0-100 progress value of the current attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    /// Submission this snapshot belongs to; `None` before the first submit
    pub attempt_id: Option<Uuid>,
    pub state: WorkflowState,
    /// Displayed progress, non-decreasing within one attempt
    pub progress: u8,
}

impl Default for WorkflowSnapshot {
    fn default() -> Self {
        Self {
            attempt_id: None,
            state: WorkflowState::Idle,
            progress: 0,
        }
    }
}

impl WorkflowSnapshot {
    /// The bar is only drawn between start and completion
    pub fn shows_progress_bar(&self) -> bool {
        self.progress > 0 && self.progress < 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file() -> SelectedFile {
        SelectedFile::new("clip.mp4", "video/mp4", 1024, "/videos/clip.mp4")
    }

    #[test]
    fn test_terminal_and_in_flight_classification() {
        let uploading = WorkflowState::Uploading {
            file: sample_file(),
            bytes_sent: 10,
            bytes_total: 1024,
        };
        assert!(uploading.is_in_flight());
        assert!(!uploading.is_terminal());

        let processing = WorkflowState::ServerProcessing {
            estimated_progress: 80,
        };
        assert!(processing.is_in_flight());

        let failed = WorkflowState::Failed {
            message: "boom".to_string(),
        };
        assert!(failed.is_terminal());
        assert!(!failed.is_in_flight());

        assert!(!WorkflowState::Idle.is_terminal());
        assert!(!WorkflowState::FileReady { file: sample_file() }.is_in_flight());
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(WorkflowState::Idle.stage_label(), None);
        assert_eq!(
            WorkflowState::ServerProcessing {
                estimated_progress: 70
            }
            .stage_label(),
            Some("Processing video")
        );
        assert_eq!(
            WorkflowState::Failed {
                message: String::new()
            }
            .stage_label(),
            None
        );
    }

    #[test]
    fn test_progress_bar_visibility() {
        let mut snapshot = WorkflowSnapshot::default();
        assert!(!snapshot.shows_progress_bar());

        snapshot.progress = 49;
        assert!(snapshot.shows_progress_bar());

        snapshot.progress = 100;
        assert!(!snapshot.shows_progress_bar());
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_value(WorkflowState::ServerProcessing {
            estimated_progress: 72,
        })
        .unwrap();
        assert_eq!(json["state"], "server_processing");
        assert_eq!(json["estimated_progress"], 72);
    }
}
