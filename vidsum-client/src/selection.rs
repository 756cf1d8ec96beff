//! File selection and drag-and-drop tracking
//!
//! Holds the file the next submit will use. Picker selections are trusted
//! as-is; dropped files must carry a `video/*` MIME type. The drag state is
//! purely cosmetic.

use crate::error::WorkflowError;
use crate::models::SelectedFile;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Whether a drag is hovering over the drop zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Active,
}

#[derive(Debug, Default)]
pub struct SelectionManager {
    current: Option<SelectedFile>,
    drag_state: DragState,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&SelectedFile> {
        self.current.as_ref()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag_state
    }

    /// Accept a file from the picker without type checks
    ///
    /// Returns the replaced selection, if any.
    pub fn select_file(&mut self, candidate: SelectedFile) -> Option<SelectedFile> {
        info!(file = %candidate.name, mime = %candidate.mime_type, size = candidate.size, "File selected");
        self.current.replace(candidate)
    }

    /// Accept a dropped file if it is a video
    ///
    /// A drop always ends the drag. On `InvalidFileType` the current
    /// selection is kept.
    pub fn select_dropped_file(
        &mut self,
        candidate: SelectedFile,
    ) -> Result<Option<SelectedFile>, WorkflowError> {
        self.drag_state = DragState::Idle;

        if !candidate.is_video() {
            debug!(file = %candidate.name, mime = %candidate.mime_type, "Dropped file rejected");
            return Err(WorkflowError::InvalidFileType {
                mime_type: candidate.mime_type,
            });
        }

        Ok(self.select_file(candidate))
    }

    pub fn drag_enter(&mut self) {
        self.drag_state = DragState::Active;
    }

    pub fn drag_over(&mut self) {
        self.drag_state = DragState::Active;
    }

    pub fn drag_leave(&mut self) {
        self.drag_state = DragState::Idle;
    }

    pub fn clear(&mut self) -> Option<SelectedFile> {
        self.current.take()
    }
}
