//! Client session
//!
//! Wires the selection manager to the upload controller over one event bus.
//! This is the surface a front end drives: pick or drop a file, submit,
//! observe.

use crate::controller::UploadController;
use crate::error::{ServiceError, WorkflowError};
use crate::events::{EventBus, WorkflowEvent};
use crate::models::{SelectedFile, SummaryResult, WorkflowSnapshot};
use crate::selection::{DragState, SelectionManager};
use crate::service::{HttpSummaryService, SummaryService};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use vidsum_common::config::{ClientConfig, ProgressConfig};

pub struct UploadSession {
    selection: Mutex<SelectionManager>,
    controller: Arc<UploadController>,
    event_bus: EventBus,
}

impl UploadSession {
    pub fn new(service: Arc<dyn SummaryService>, progress: ProgressConfig) -> Self {
        let event_bus = EventBus::default();
        let controller = UploadController::new(service, progress, event_bus.clone());
        Self {
            selection: Mutex::new(SelectionManager::new()),
            controller: Arc::new(controller),
            event_bus,
        }
    }

    /// Session against the HTTP service named in the config
    pub fn connect(config: &ClientConfig) -> Result<Self, ServiceError> {
        let service = HttpSummaryService::new(config)?;
        Ok(Self::new(Arc::new(service), config.progress))
    }

    pub fn controller(&self) -> &Arc<UploadController> {
        &self.controller
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.event_bus.subscribe()
    }

    pub fn watch(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.controller.watch()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.controller.snapshot()
    }

    pub fn selected_file(&self) -> Option<SelectedFile> {
        self.selection.lock().current().cloned()
    }

    pub fn drag_state(&self) -> DragState {
        self.selection.lock().drag_state()
    }

    pub fn select_file(&self, file: SelectedFile) {
        let mut selection = self.selection.lock();
        selection.select_file(file);
        self.controller.note_selection(selection.current());
    }

    /// Drop a file; non-video files emit `InvalidFileType` and change nothing
    pub fn select_dropped_file(&self, file: SelectedFile) -> Result<(), WorkflowError> {
        let file_name = file.name.clone();
        let mut selection = self.selection.lock();

        match selection.select_dropped_file(file) {
            Ok(_) => {
                self.controller.note_selection(selection.current());
                Ok(())
            }
            Err(e) => {
                if let WorkflowError::InvalidFileType { mime_type } = &e {
                    self.event_bus.emit_lossy(WorkflowEvent::InvalidFileType {
                        file_name,
                        mime_type: mime_type.clone(),
                        timestamp: Utc::now(),
                    });
                }
                Err(e)
            }
        }
    }

    pub fn drag_enter(&self) {
        self.selection.lock().drag_enter();
    }

    pub fn drag_over(&self) {
        self.selection.lock().drag_over();
    }

    pub fn drag_leave(&self) {
        self.selection.lock().drag_leave();
    }

    pub fn clear_selection(&self) {
        let mut selection = self.selection.lock();
        selection.clear();
        self.controller.note_selection(None);
    }

    /// Submit the current selection
    ///
    /// The selection stays in place afterwards, so a failed attempt can be
    /// resubmitted without picking the file again.
    pub async fn submit(&self) -> Result<SummaryResult, WorkflowError> {
        let file = self.selected_file();
        self.controller.submit(file.as_ref()).await
    }
}
