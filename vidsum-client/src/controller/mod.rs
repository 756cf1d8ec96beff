//! Upload-and-poll controller
//!
//! Drives one submission from `FileReady` to a terminal state:
//!
//! 1. `Uploading`: streamed multipart upload, byte progress scaled to 0-70
//! 2. `ServerProcessing`: result fetch races the progress estimator (70-95)
//! 3. `Succeeded` (via `ServerProcessing(100)`) or `Failed`
//!
//! At most one submission is in flight; a second `submit` is refused with
//! `SubmissionInProgress` and leaves the running attempt untouched. The
//! estimator is cancelled before any terminal transition, and the state cell
//! drops late ticks regardless.

mod state_cell;

use crate::error::{WorkflowError, GENERIC_FAILURE_MESSAGE};
use crate::events::{EventBus, WorkflowEvent};
use crate::models::{SelectedFile, SummaryResult, WorkflowSnapshot, WorkflowState};
use crate::progress::ProgressEstimator;
use crate::service::{SummaryService, UploadProgressFn};
use chrono::Utc;
use state_cell::StateCell;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;
use vidsum_common::config::ProgressConfig;

/// Single owner of the workflow state
pub struct UploadController {
    service: Arc<dyn SummaryService>,
    progress: ProgressConfig,
    cell: Arc<StateCell>,
}

impl UploadController {
    pub fn new(
        service: Arc<dyn SummaryService>,
        progress: ProgressConfig,
        event_bus: EventBus,
    ) -> Self {
        Self {
            service,
            progress,
            cell: Arc::new(StateCell::new(event_bus)),
        }
    }

    /// Current state and progress
    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.cell.snapshot()
    }

    pub fn state(&self) -> WorkflowState {
        self.cell.snapshot().state
    }

    /// Latest-value view of the workflow, for renderers that redraw
    pub fn watch(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.cell.watch()
    }

    /// Every state change and signal, in order
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.cell.event_bus().subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.cell.is_busy()
    }

    pub fn service(&self) -> &Arc<dyn SummaryService> {
        &self.service
    }

    /// Mirror the selection into `Idle`/`FileReady` while nothing runs
    pub fn note_selection(&self, file: Option<&SelectedFile>) {
        self.cell.note_selection(file);
    }

    /// Run one submission to completion
    ///
    /// Observers follow progress through `watch()` or `subscribe()`; the
    /// return value repeats the terminal outcome. Local refusals
    /// (`NoFileSelected`, `SubmissionInProgress`) emit `SubmissionRejected`
    /// and leave state unchanged.
    ///
    /// Dropping the returned future abandons the attempt as `Failed`.
    pub async fn submit(
        &self,
        file: Option<&SelectedFile>,
    ) -> Result<SummaryResult, WorkflowError> {
        let Some(file) = file else {
            return Err(self.refuse(WorkflowError::NoFileSelected));
        };

        let attempt_id = match self.cell.try_begin(file) {
            Ok(id) => id,
            Err(e) => return Err(self.refuse(e)),
        };

        let mut guard = AttemptGuard {
            cell: self.cell.clone(),
            attempt_id,
            settled: false,
        };

        let outcome = self.run_attempt(attempt_id, file).await;
        match &outcome {
            Ok(result) => self.cell.finish_success(attempt_id, result.clone()),
            Err(e) => self.cell.finish_failure(attempt_id, e.user_message()),
        }
        guard.settled = true;

        outcome
    }

    async fn run_attempt(
        &self,
        attempt_id: Uuid,
        file: &SelectedFile,
    ) -> Result<SummaryResult, WorkflowError> {
        let floor = self.progress.floor;

        let cell = self.cell.clone();
        let on_progress: UploadProgressFn = Arc::new(move |sent, total| {
            cell.apply_upload_progress(attempt_id, sent, total, floor);
        });

        let handle = self
            .service
            .upload(file, on_progress)
            .await
            .map_err(|e| e.into_upload_error())?;

        // Upload complete even if the transport never reported the last chunk
        self.cell
            .apply_upload_progress(attempt_id, file.size, file.size, floor);
        self.cell.enter_processing(attempt_id, floor);
        info!(%attempt_id, %handle, "Upload complete, waiting for summary");

        let cell = self.cell.clone();
        let estimator = ProgressEstimator::new(self.progress)
            .start(move |value| cell.apply_estimate(attempt_id, value));

        let fetched = self.service.fetch_summary(&handle).await;

        // No estimator value may land after this point
        estimator.stop().await;
        debug!(%attempt_id, %handle, "Upload handle released");

        fetched.map_err(|e| e.into_processing_error())
    }

    fn refuse(&self, error: WorkflowError) -> WorkflowError {
        warn!(error = %error, "Submission refused");
        self.cell
            .event_bus()
            .emit_lossy(WorkflowEvent::SubmissionRejected {
                reason: error.user_message(),
                timestamp: Utc::now(),
            });
        error
    }
}

/// Fails the attempt if `submit` is dropped before settling it
struct AttemptGuard {
    cell: Arc<StateCell>,
    attempt_id: Uuid,
    settled: bool,
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.cell
                .finish_failure(self.attempt_id, GENERIC_FAILURE_MESSAGE.to_string());
        }
    }
}
